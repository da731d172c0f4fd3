mod config;
mod directory;
mod manager;
mod search;

pub use config::{FileManagerConfig, UploadOptions};
pub use directory::{DirectoryTree, DEFAULT_ROOT_NAME};
pub use manager::{DownloadedFile, FileManager, FileManagerError, ImportOrigin, ImportedFile};
pub use search::SearchCriteria;
