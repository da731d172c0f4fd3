use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::provider::{FeedError, FeedProvider, FeedUpdate, SignedUpdate, Topic};
use crate::crypto::{PublicKey, SecretKey};
use crate::reference::Reference;
use crate::store::PaymentStamp;

/// In-memory feed provider. Clones share the same feeds.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeedProvider {
    inner: Arc<RwLock<MemoryFeedProviderInner>>,
}

#[derive(Debug, Default)]
struct MemoryFeedProviderInner {
    /// owner -> topic -> latest signed update
    feeds: HashMap<PublicKey, HashMap<Topic, SignedUpdate>>,
}

impl MemoryFeedProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedProvider for MemoryFeedProvider {
    async fn latest(
        &self,
        owner: &PublicKey,
        topic: &Topic,
    ) -> Result<Option<FeedUpdate>, FeedError> {
        let inner = self.inner.read().map_err(|e| {
            FeedError::Default(anyhow::anyhow!("failed to acquire read lock: {}", e))
        })?;

        inner
            .feeds
            .get(owner)
            .and_then(|topics| topics.get(topic))
            .cloned()
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
        let mut inner = self.inner.write().map_err(|e| {
            FeedError::Default(anyhow::anyhow!("failed to acquire write lock: {}", e))
        })?;

        let topics = inner.feeds.entry(owner).or_default();
        let index = topics.get(topic).map(|current| current.index + 1).unwrap_or(0);
        let update = SignedUpdate::sign(signer, *topic, index, reference.clone());
        topics.insert(*topic, update);

        Ok(FeedUpdate {
            reference: reference.clone(),
            index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp() -> PaymentStamp {
        PaymentStamp::new("stamp")
    }

    #[tokio::test]
    async fn test_empty_feed_is_none() {
        let feeds = MemoryFeedProvider::new();
        let owner = SecretKey::generate().public();
        assert_eq!(feeds.latest(&owner, &Topic::default()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_publish_increments_index() {
        let feeds = MemoryFeedProvider::new();
        let signer = SecretKey::generate();
        let topic = Topic::default();

        let first = feeds
            .publish(&signer, &topic, &stamp(), &Reference::from([1u8; 32]))
            .await
            .unwrap();
        let second = feeds
            .publish(&signer, &topic, &stamp(), &Reference::from([2u8; 32]))
            .await
            .unwrap();

        assert_eq!(first.index, 0);
        assert_eq!(second.index, 1);
        assert_eq!(
            feeds.latest(&signer.public(), &topic).await.unwrap(),
            Some(second)
        );
    }

    #[tokio::test]
    async fn test_feeds_are_scoped_by_owner_and_topic() {
        let feeds = MemoryFeedProvider::new();
        let alice = SecretKey::generate();
        let bob = SecretKey::generate();
        let topic = Topic::default();

        feeds
            .publish(&alice, &topic, &stamp(), &Reference::from([1u8; 32]))
            .await
            .unwrap();

        assert!(feeds.latest(&bob.public(), &topic).await.unwrap().is_none());
        assert!(feeds
            .latest(&alice.public(), &Topic::from_name("elsewhere"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_tampered_update_fails_read() {
        let feeds = MemoryFeedProvider::new();
        let signer = SecretKey::generate();
        let topic = Topic::default();
        feeds
            .publish(&signer, &topic, &stamp(), &Reference::from([1u8; 32]))
            .await
            .unwrap();

        {
            let mut inner = feeds.inner.write().unwrap();
            let update = inner
                .feeds
                .get_mut(&signer.public())
                .and_then(|topics| topics.get_mut(&topic))
                .unwrap();
            update.reference = Reference::from([6u8; 32]);
        }

        assert!(matches!(
            feeds.latest(&signer.public(), &topic).await,
            Err(FeedError::InvalidSignature { .. })
        ));
    }
}
