use crate::crypto::SecretKey;
use crate::feed::Topic;
use crate::manifest::CustomMetadata;
use crate::store::RedundancyLevel;

/// Everything a [`FileManager`](super::FileManager) needs besides
///  its collaborators
#[derive(Debug, Clone, Default)]
pub struct FileManagerConfig {
    /// Key owning the manifest feed. Required.
    pub secret_key: Option<SecretKey>,
    /// Topic the manifest root is published under
    pub topic: Topic,
    /// Redundancy used for uploads that don't ask for one,
    ///  and for manifest nodes
    pub redundancy_level: RedundancyLevel,
}

impl FileManagerConfig {
    pub fn new(secret_key: SecretKey) -> Self {
        Self {
            secret_key: Some(secret_key),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Logical path in the manifest; defaults to the local path
    pub destination: Option<String>,
    pub custom_metadata: CustomMetadata,
    /// Overrides the `Filename` recorded for a new file
    pub filename: Option<String>,
    pub redundancy_level: Option<RedundancyLevel>,
    /// Save the manifest and move the feed after the upload
    pub auto_save: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            destination: None,
            custom_metadata: CustomMetadata::new(),
            filename: None,
            redundancy_level: None,
            auto_save: true,
        }
    }
}
