use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::crypto::{PublicKey, SecretKey, Signature};
use crate::reference::Reference;
use crate::store::PaymentStamp;

pub const TOPIC_SIZE: usize = 32;
/// Topic name the file manager publishes its manifest root under
pub const DEFAULT_TOPIC_NAME: &str = "hivefs/file-manager";

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("invalid signature on feed update {index} for {owner} / {topic}")]
    InvalidSignature {
        owner: PublicKey,
        topic: Topic,
        index: u64,
    },
    #[error("feed update for {found} stored under {expected}")]
    OwnerMismatch { expected: PublicKey, found: PublicKey },
    #[error("payment stamp rejected: {0}")]
    InvalidStamp(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("feed record error: {0}")]
    Record(#[from] serde_json::Error),
    #[error("unhandled feed error: {0}")]
    Default(#[from] anyhow::Error),
}

/// Name of a feed, scoped to its owner
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Topic([u8; TOPIC_SIZE]);

impl Topic {
    /// Derive a topic by hashing a human readable name
    pub fn from_name(name: &str) -> Self {
        Topic(*blake3::hash(name.as_bytes()).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; TOPIC_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; TOPIC_SIZE]> for Topic {
    fn from(bytes: [u8; TOPIC_SIZE]) -> Self {
        Topic(bytes)
    }
}

impl Default for Topic {
    fn default() -> Self {
        Self::from_name(DEFAULT_TOPIC_NAME)
    }
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Topic({})", self.to_hex())
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// The current value of a feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedUpdate {
    pub reference: Reference,
    /// Sequence number, 0 for the first update
    pub index: u64,
}

/// A feed update as providers keep it: the pointer plus
///  the owner's signature over topic, index and reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUpdate {
    pub owner: PublicKey,
    pub topic: Topic,
    pub index: u64,
    pub reference: Reference,
    pub signature: Signature,
}

impl SignedUpdate {
    pub fn sign(signer: &SecretKey, topic: Topic, index: u64, reference: Reference) -> Self {
        let signature = signer.sign(&Self::payload(&topic, index, &reference));
        SignedUpdate {
            owner: signer.public(),
            topic,
            index,
            reference,
            signature,
        }
    }

    /// topic || index (big endian) || reference
    fn payload(topic: &Topic, index: u64, reference: &Reference) -> Vec<u8> {
        let mut payload = Vec::with_capacity(TOPIC_SIZE + 8 + reference.len());
        payload.extend_from_slice(topic.as_bytes());
        payload.extend_from_slice(&index.to_be_bytes());
        payload.extend_from_slice(reference.as_bytes());
        payload
    }

    pub fn verify(&self) -> Result<(), FeedError> {
        let payload = Self::payload(&self.topic, self.index, &self.reference);
        self.owner
            .verify(&payload, &self.signature)
            .map_err(|_| FeedError::InvalidSignature {
                owner: self.owner,
                topic: self.topic,
                index: self.index,
            })
    }

    /// Check the signature and that the update belongs to `owner`,
    ///  then strip it down to the pointer
    pub fn verified(self, owner: &PublicKey) -> Result<FeedUpdate, FeedError> {
        if &self.owner != owner {
            return Err(FeedError::OwnerMismatch {
                expected: *owner,
                found: self.owner,
            });
        }
        self.verify()?;
        Ok(FeedUpdate {
            reference: self.reference,
            index: self.index,
        })
    }
}

/// Mutable, owner-signed pointers keyed by owner and topic
#[async_trait]
pub trait FeedProvider: Send + Sync + std::fmt::Debug {
    /// Latest update of the feed owned by `owner` under `topic`
    ///
    /// # Returns
    /// * `Ok(Some(FeedUpdate))` - The verified latest update
    /// * `Ok(None)` - Nothing was ever written to this feed
    /// * `Err(FeedError::InvalidSignature)` - The stored update was not
    ///   signed by `owner`
    async fn latest(
        &self,
        owner: &PublicKey,
        topic: &Topic,
    ) -> Result<Option<FeedUpdate>, FeedError>;

    /// Point the signer's feed under `topic` at `reference`, at the
    ///  index after the current one (0 for a new feed).
    ///
    /// The owner is always the signer's public key, so there is no
    ///  way to address a write to somebody else's feed.
    async fn publish(
        &self,
        signer: &SecretKey,
        topic: &Topic,
        stamp: &PaymentStamp,
        reference: &Reference,
    ) -> Result<FeedUpdate, FeedError>;
}
