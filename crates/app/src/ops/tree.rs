use clap::Args;
use common::file_manager::{FileManagerError, DEFAULT_ROOT_NAME};

use crate::op::SessionError;

#[derive(Args, Debug, Clone)]
pub struct Tree {
    /// Name of the key the tree is wrapped under
    #[arg(long, default_value = DEFAULT_ROOT_NAME)]
    pub root_name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("tree failed: {0}")]
    FileManager(#[from] FileManagerError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Tree {
    type Error = TreeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let session = ctx.session().await?;
        let manager = &session.manager;

        let tree = manager.get_directory_structure(manager.trie(), &self.root_name)?;
        Ok(serde_json::to_string_pretty(&tree)?)
    }
}
