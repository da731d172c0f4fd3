mod fs;
mod memory;
mod node_store;
mod provider;

pub use fs::FsContentStore;
pub use memory::MemoryContentStore;
pub use node_store::{ContentNodeStore, MANIFEST_NODE_NAME};
pub use provider::{
    ContentStore, ContentStoreError, FetchedData, PaymentStamp, RedundancyLevel, StoreOptions,
};
