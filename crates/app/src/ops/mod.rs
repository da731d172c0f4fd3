pub mod dir;
pub mod download;
pub mod import;
pub mod init;
pub mod ls;
pub mod rm;
pub mod search;
pub mod tree;
pub mod upload;

pub use dir::Dir;
pub use download::Download;
pub use import::Import;
pub use init::Init;
pub use ls::Ls;
pub use rm::Rm;
pub use search::Search;
pub use tree::Tree;
pub use upload::Upload;
