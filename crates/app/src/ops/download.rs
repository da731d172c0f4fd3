use std::path::{Component, Path, PathBuf};

use clap::Args;
use common::file_manager::{DownloadedFile, FileManagerError};

use crate::op::SessionError;

#[derive(Args, Debug, Clone)]
pub struct Download {
    /// Path in the manifest; every file is downloaded when omitted
    pub path: Option<String>,

    /// Where to write: a file for a single download, a directory
    ///  otherwise (defaults to the basename / the current directory)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("download failed: {0}")]
    FileManager(#[from] FileManagerError),
    #[error("refusing to write outside the output directory: {0}")]
    UnsafePath(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Join a logical path onto `root`, rejecting anything that
///  would climb out of it
fn output_path(root: &Path, logical: &str) -> Result<PathBuf, DownloadError> {
    let relative = Path::new(logical);
    if relative
        .components()
        .any(|component| !matches!(component, Component::Normal(_)))
    {
        return Err(DownloadError::UnsafePath(logical.to_string()));
    }
    Ok(root.join(relative))
}

async fn write_file(target: &Path, file: &DownloadedFile) -> Result<(), DownloadError> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(target, &file.data).await?;
    Ok(())
}

#[async_trait::async_trait]
impl crate::op::Op for Download {
    type Error = DownloadError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let session = ctx.session().await?;
        let manager = &session.manager;

        if let Some(path) = &self.path {
            let file = manager.download_file(manager.trie(), path).await?;
            let target = match &self.output {
                Some(output) => output.clone(),
                None => {
                    let name = file
                        .metadata
                        .filename
                        .clone()
                        .unwrap_or_else(|| common::manifest::basename(&file.path).to_string());
                    output_path(Path::new("."), &name)?
                }
            };
            write_file(&target, &file).await?;
            return Ok(format!(
                "Downloaded {} ({} bytes) to {}",
                file.path,
                file.data.len(),
                target.display()
            ));
        }

        let root = self.output.clone().unwrap_or_else(|| PathBuf::from("."));
        let Some(files) = manager.download_files(manager.trie()).await? else {
            return Ok("No files in manifest".to_string());
        };

        let expected = manager.trie().len();
        let mut written = 0;
        for file in &files {
            match output_path(&root, &file.path) {
                Ok(target) => {
                    write_file(&target, file).await?;
                    written += 1;
                }
                Err(e) => tracing::warn!("skipping {}: {}", file.path, e),
            }
        }

        Ok(format!(
            "Downloaded {}/{} files to {}",
            written,
            expected,
            root.display()
        ))
    }
}
