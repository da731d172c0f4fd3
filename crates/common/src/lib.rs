/**
 * Ed25519 identity used to own and sign
 *  feed updates.
 */
pub mod crypto;
/**
 * Mutable, owner-signed pointers that anchor the
 *  current manifest root for an owner + topic.
 */
pub mod feed;
/**
 * Orchestration over the manifest, the content
 *  store and the feed: upload, download, list,
 *  search, directory views and imports.
 */
pub mod file_manager;
/**
 * The manifest trie mapping logical file paths
 *  to content references and metadata.
 */
pub mod manifest;
/**
 * Fixed-length content references into the
 *  storage network.
 */
pub mod reference;
/**
 * "Settle all" fan-out helper shared by the
 *  batch operations.
 */
pub mod settle;
/**
 * Content store collaborator: the narrow interface
 *  we need from the storage network, plus memory
 *  and local-directory implementations.
 */
pub mod store;

pub mod prelude {
    pub use crate::crypto::{PublicKey, SecretKey};
    pub use crate::feed::{FeedProvider, FeedSync, FeedUpdate, Topic};
    pub use crate::file_manager::{
        FileManager, FileManagerConfig, FileManagerError, SearchCriteria, UploadOptions,
    };
    pub use crate::manifest::{FileEntry, FileMetadata, ManifestTrie, TrieError};
    pub use crate::reference::Reference;
    pub use crate::store::{ContentStore, PaymentStamp, RedundancyLevel};
}
