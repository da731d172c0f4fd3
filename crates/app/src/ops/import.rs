use clap::Args;
use common::file_manager::FileManagerError;
use common::reference::Reference;

use crate::op::SessionError;

#[derive(Args, Debug, Clone)]
pub struct Import {
    /// References to import; the pinned set is imported when none are given
    pub references: Vec<Reference>,
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("import failed: {0}")]
    FileManager(#[from] FileManagerError),
}

#[async_trait::async_trait]
impl crate::op::Op for Import {
    type Error = ImportError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut session = ctx.session().await?;

        let seed = (!self.references.is_empty()).then(|| self.references.clone());
        let imported = session.manager.initialize(&session.stamp, seed).await?;

        if imported.is_empty() {
            return Ok("Nothing new to import".to_string());
        }
        let mut lines = vec![format!("Imported {} files", imported.len())];
        lines.extend(
            imported
                .iter()
                .map(|file| format!("  {} -> {}", file.path, file.reference)),
        );
        Ok(lines.join("\n"))
    }
}
