use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::provider::{FeedError, FeedProvider, FeedUpdate, SignedUpdate, Topic};
use crate::crypto::{PublicKey, SecretKey};
use crate::reference::Reference;
use crate::store::PaymentStamp;

/// Feed provider backed by a local directory, keeping the latest
///  signed update of each feed at `<root>/<owner hex>/<topic hex>.json`
#[derive(Debug, Clone)]
pub struct FsFeedProvider {
    root: PathBuf,
}

impl FsFeedProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn feed_path(&self, owner: &PublicKey, topic: &Topic) -> PathBuf {
        self.root
            .join(owner.to_hex())
            .join(format!("{}.json", topic.to_hex()))
    }

    async fn read_update(
        &self,
        owner: &PublicKey,
        topic: &Topic,
    ) -> Result<Option<SignedUpdate>, FeedError> {
        match tokio::fs::read(self.feed_path(owner, topic)).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl FeedProvider for FsFeedProvider {
    async fn latest(
        &self,
        owner: &PublicKey,
        topic: &Topic,
    ) -> Result<Option<FeedUpdate>, FeedError> {
        self.read_update(owner, topic)
            .await?
            .map(|update| update.verified(owner))
            .transpose()
    }

    async fn publish(
        &self,
        signer: &SecretKey,
        topic: &Topic,
        stamp: &PaymentStamp,
        reference: &Reference,
    ) -> Result<FeedUpdate, FeedError> {
        if stamp.as_str().is_empty() {
            return Err(FeedError::InvalidStamp(stamp.to_string()));
        }

        let owner = signer.public();
        let index = match self.read_update(&owner, topic).await? {
            Some(current) => current.index + 1,
            None => 0,
        };
        let update = SignedUpdate::sign(signer, *topic, index, reference.clone());

        let path = self.feed_path(&owner, topic);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // write then rename so readers never see a half written record
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, serde_json::to_vec_pretty(&update)?).await?;
        tokio::fs::rename(&staging, &path).await?;

        Ok(FeedUpdate {
            reference: reference.clone(),
            index,
        })
    }
}
