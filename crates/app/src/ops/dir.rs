use clap::Args;
use common::file_manager::{FileManagerError, DEFAULT_ROOT_NAME};

use crate::op::SessionError;

#[derive(Args, Debug, Clone)]
pub struct Dir {
    /// Directory to list, relative to the manifest root
    #[arg(default_value = "")]
    pub path: String,

    /// Name of the key the tree is wrapped under
    #[arg(long, default_value = DEFAULT_ROOT_NAME)]
    pub root_name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DirError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("dir failed: {0}")]
    FileManager(#[from] FileManagerError),
}

#[async_trait::async_trait]
impl crate::op::Op for Dir {
    type Error = DirError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let session = ctx.session().await?;
        let manager = &session.manager;

        let names = manager.get_contents_of_directory(&self.path, manager.trie(), &self.root_name)?;
        if names.is_empty() {
            return Ok(format!("No entries under '{}'", self.path));
        }
        Ok(names.join("\n"))
    }
}
