use std::error::Error;
use std::path::PathBuf;

use common::feed::FsFeedProvider;
use common::file_manager::{FileManager, FileManagerConfig, FileManagerError};
use common::store::{FsContentStore, PaymentStamp};

use crate::state::{AppState, StateError};

/// File manager over the local directory node
pub type LocalFileManager = FileManager<FsContentStore, FsFeedProvider>;

#[derive(Clone)]
pub struct OpContext {
    /// Optional custom state path (defaults to ~/.hivefs)
    pub config_path: Option<PathBuf>,
}

/// A loaded file manager plus the stamp to pay for writes with
pub struct Session {
    pub manager: LocalFileManager,
    pub stamp: PaymentStamp,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    FileManager(#[from] FileManagerError),
}

impl OpContext {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }

    pub fn state(&self) -> Result<AppState, StateError> {
        AppState::load(self.config_path.clone())
    }

    /// Build a file manager over the state directory and load the
    ///  manifest our feed currently points at
    pub async fn session(&self) -> Result<Session, SessionError> {
        let state = self.state()?;
        let config = FileManagerConfig {
            secret_key: Some(state.load_key()?),
            topic: state.config.topic(),
            redundancy_level: state.config.redundancy_level,
        };

        let mut manager = FileManager::new(
            FsContentStore::new(&state.blobs_path),
            FsFeedProvider::new(&state.feeds_path),
            config,
        )?;
        manager.load_from_feed().await?;

        Ok(Session {
            manager,
            stamp: state.config.stamp(),
        })
    }
}

/// Parse a `key=value` pair
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("invalid key=value pair: {}", s)),
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
