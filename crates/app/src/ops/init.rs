use clap::Args;
use common::store::RedundancyLevel;

use crate::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Payment stamp used for uploads and feed writes
    #[arg(long, default_value = "local")]
    pub stamp: String,

    /// Default redundancy level (off, medium, strong, insane, paranoid)
    #[arg(long, default_value = "off")]
    pub redundancy_level: RedundancyLevel,

    /// Name of the feed topic the manifest is published under
    #[arg(long)]
    pub topic: Option<String>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut config = AppConfig {
            stamp: self.stamp.clone(),
            redundancy_level: self.redundancy_level,
            log_level: self.log_level.clone(),
            ..Default::default()
        };
        if let Some(topic) = &self.topic {
            config.topic = topic.clone();
        }

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;
        let owner = state.load_key()?.public();

        let output = format!(
            "Initialized hivefs directory at: {}\n\
             - Key: {}\n\
             - Blobs: {}\n\
             - Feeds: {}\n\
             - Config: {}\n\
             - Owner: {}\n\
             - Topic: {} ({})",
            state.dir.display(),
            state.key_path.display(),
            state.blobs_path.display(),
            state.feeds_path.display(),
            state.config_path.display(),
            owner,
            state.config.topic,
            state.config.topic(),
        );

        Ok(output)
    }
}
