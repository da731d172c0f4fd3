use std::path::PathBuf;

use clap::Args;
use common::file_manager::{FileManagerError, UploadOptions};
use common::manifest::CustomMetadata;
use common::store::RedundancyLevel;

use crate::op::{parse_key_val, SessionError};

#[derive(Args, Debug, Clone)]
pub struct Upload {
    /// Local file to upload
    pub path: PathBuf,

    /// Path in the manifest (defaults to the local path)
    #[arg(long)]
    pub dest: Option<String>,

    /// Custom metadata, repeatable (key=value)
    #[arg(long = "meta", value_parser = parse_key_val)]
    pub metadata: Vec<(String, String)>,

    /// Filename to record instead of the basename of the path
    #[arg(long)]
    pub filename: Option<String>,

    /// Redundancy level for this upload
    #[arg(long)]
    pub redundancy_level: Option<RedundancyLevel>,

    /// Store the content without saving the manifest or moving the feed
    #[arg(long)]
    pub no_save: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("upload failed: {0}")]
    FileManager(#[from] FileManagerError),
}

#[async_trait::async_trait]
impl crate::op::Op for Upload {
    type Error = UploadError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut session = ctx.session().await?;

        let options = UploadOptions {
            destination: self.dest.clone(),
            custom_metadata: self.metadata.iter().cloned().collect::<CustomMetadata>(),
            filename: self.filename.clone(),
            redundancy_level: self.redundancy_level,
            auto_save: !self.no_save,
        };
        let reference = session
            .manager
            .upload_file(&session.stamp, &self.path, options)
            .await?;

        let mut output = format!("Uploaded {} as {}", self.path.display(), reference);
        if self.no_save {
            output.push_str("\nManifest not saved");
        } else if let Some(root) = session.manager.trie().root_reference() {
            output.push_str(&format!("\nManifest root: {}", root));
        }
        Ok(output)
    }
}
