mod fs;
mod memory;
mod provider;
mod sync;

pub use fs::FsFeedProvider;
pub use memory::MemoryFeedProvider;
pub use provider::{
    FeedError, FeedProvider, FeedUpdate, SignedUpdate, Topic, DEFAULT_TOPIC_NAME, TOPIC_SIZE,
};
pub use sync::FeedSync;
