use clap::Args;
use common::file_manager::FileManagerError;

use crate::op::SessionError;

#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Print every file with its metadata as JSON
    #[arg(long)]
    pub metadata: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("list failed: {0}")]
    FileManager(#[from] FileManagerError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Ls {
    type Error = LsError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let session = ctx.session().await?;
        let manager = &session.manager;

        let mut files = manager.list_files(manager.trie(), self.metadata)?;
        files.sort_by(|a, b| a.path.cmp(&b.path));

        if self.metadata {
            return Ok(serde_json::to_string_pretty(&files)?);
        }
        if files.is_empty() {
            return Ok("No files in manifest".to_string());
        }
        Ok(files
            .into_iter()
            .map(|file| file.path)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
