use std::{fs, path::PathBuf};

use common::feed::{Topic, DEFAULT_TOPIC_NAME};
use common::prelude::SecretKey;
use common::store::{PaymentStamp, RedundancyLevel};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "hivefs";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.pem";
pub const BLOBS_DIR_NAME: &str = "blobs";
pub const FEEDS_DIR_NAME: &str = "feeds";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Payment stamp used for uploads and feed writes
    #[serde(default = "default_stamp")]
    pub stamp: String,
    /// Redundancy for uploads that don't ask for one
    #[serde(default)]
    pub redundancy_level: RedundancyLevel,
    /// Name the manifest feed topic is derived from
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Log filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_stamp() -> String {
    "local".to_string()
}

fn default_topic() -> String {
    DEFAULT_TOPIC_NAME.to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            stamp: default_stamp(),
            redundancy_level: RedundancyLevel::default(),
            topic: default_topic(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn stamp(&self) -> PaymentStamp {
        PaymentStamp::new(self.stamp.clone())
    }

    pub fn topic(&self) -> Topic {
        Topic::from_name(&self.topic)
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the state directory (~/.hivefs)
    pub dir: PathBuf,
    /// Path to the owner key PEM file
    pub key_path: PathBuf,
    /// Path to the local content store
    pub blobs_path: PathBuf,
    /// Path to the local feed store
    pub feeds_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the state directory path (custom or default ~/.hivefs)
    pub fn state_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory with a fresh owner key
    pub fn init(custom_path: Option<PathBuf>, config: Option<AppConfig>) -> Result<Self, StateError> {
        let dir = Self::state_dir(custom_path)?;

        if dir.join(CONFIG_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&dir)?;

        let blobs_path = dir.join(BLOBS_DIR_NAME);
        fs::create_dir_all(&blobs_path)?;
        let feeds_path = dir.join(FEEDS_DIR_NAME);
        fs::create_dir_all(&feeds_path)?;

        let key = SecretKey::generate();
        let key_path = dir.join(KEY_FILE_NAME);
        fs::write(&key_path, key.to_pem())?;

        let config = config.unwrap_or_default();
        let config_path = dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            dir,
            key_path,
            blobs_path,
            feeds_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the state directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let dir = Self::state_dir(custom_path)?;

        if !dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let key_path = dir.join(KEY_FILE_NAME);
        let blobs_path = dir.join(BLOBS_DIR_NAME);
        let feeds_path = dir.join(FEEDS_DIR_NAME);
        let config_path = dir.join(CONFIG_FILE_NAME);

        if !key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !blobs_path.exists() {
            return Err(StateError::MissingFile(format!("{}/", BLOBS_DIR_NAME)));
        }
        if !feeds_path.exists() {
            return Err(StateError::MissingFile(format!("{}/", FEEDS_DIR_NAME)));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            dir,
            key_path,
            blobs_path,
            feeds_path,
            config_path,
            config,
        })
    }

    /// Load the secret key from the key file
    pub fn load_key(&self) -> Result<SecretKey, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        let key = SecretKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(key)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("hivefs directory not initialized. Run 'hivefs init' first")]
    NotInitialized,

    #[error("hivefs directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
