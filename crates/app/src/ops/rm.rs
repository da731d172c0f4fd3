use clap::Args;
use common::file_manager::FileManagerError;

use crate::op::SessionError;

#[derive(Args, Debug, Clone)]
pub struct Rm {
    /// Path in the manifest to remove
    pub path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RmError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("rm failed: {0}")]
    FileManager(#[from] FileManagerError),
}

#[async_trait::async_trait]
impl crate::op::Op for Rm {
    type Error = RmError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut session = ctx.session().await?;

        let reference = session.manager.remove_file(&self.path)?;
        let update = session.manager.save_trie(&session.stamp).await?;

        Ok(format!(
            "Removed {} ({})\nManifest root: {} (index {})",
            self.path, reference, update.reference, update.index
        ))
    }
}
