use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::reference::Reference;

#[derive(Debug, thiserror::Error)]
pub enum ContentStoreError {
    #[error("content not found: {0}")]
    NotFound(Reference),
    #[error("payment stamp rejected: {0}")]
    InvalidStamp(String),
    #[error("a payment stamp is required to store content")]
    MissingStamp,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sidecar error: {0}")]
    Sidecar(#[from] serde_json::Error),
    #[error("unhandled content store error: {0}")]
    Default(#[from] anyhow::Error),
}

/// Opaque credential the storage network requires before
///  it accepts an upload (a postage batch identifier)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentStamp(String);

impl PaymentStamp {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PaymentStamp {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

/// Erasure coding strength requested for an upload.
///  Opaque to us, handed straight to the content store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedundancyLevel {
    #[default]
    Off = 0,
    Medium = 1,
    Strong = 2,
    Insane = 3,
    Paranoid = 4,
}

impl RedundancyLevel {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for RedundancyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RedundancyLevel::Off => "off",
            RedundancyLevel::Medium => "medium",
            RedundancyLevel::Strong => "strong",
            RedundancyLevel::Insane => "insane",
            RedundancyLevel::Paranoid => "paranoid",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for RedundancyLevel {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "0" => Ok(RedundancyLevel::Off),
            "medium" | "1" => Ok(RedundancyLevel::Medium),
            "strong" | "2" => Ok(RedundancyLevel::Strong),
            "insane" | "3" => Ok(RedundancyLevel::Insane),
            "paranoid" | "4" => Ok(RedundancyLevel::Paranoid),
            other => Err(anyhow::anyhow!("unknown redundancy level: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreOptions {
    pub content_type: Option<String>,
    pub redundancy_level: RedundancyLevel,
    /// Keep the content in the node's pinned set
    pub pin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedData {
    pub data: Bytes,
    pub name: Option<String>,
    pub content_type: Option<String>,
}

/// The narrow slice of the storage network the file manager needs
#[async_trait]
pub trait ContentStore: Send + Sync + std::fmt::Debug {
    /// Store `data` under `name`, paid for with `stamp`
    ///
    /// # Returns
    /// * `Ok(Reference)` - The content reference of the stored bytes
    /// * `Err(ContentStoreError::InvalidStamp)` - The stamp was rejected
    async fn store(
        &self,
        stamp: &PaymentStamp,
        data: Bytes,
        name: &str,
        options: StoreOptions,
    ) -> Result<Reference, ContentStoreError>;

    /// Fetch the bytes stored under `reference`
    ///
    /// Should fail with `ContentStoreError::NotFound` when the
    ///  content is not retrievable.
    async fn fetch(&self, reference: &Reference) -> Result<FetchedData, ContentStoreError>;

    /// References pinned by this node. Pins may outlive the
    ///  content they point at.
    async fn list_pinned(&self) -> Result<Vec<Reference>, ContentStoreError>;
}
