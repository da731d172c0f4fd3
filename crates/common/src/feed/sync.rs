use super::provider::{FeedError, FeedProvider, FeedUpdate, Topic};
use crate::crypto::{PublicKey, SecretKey};
use crate::reference::Reference;
use crate::store::PaymentStamp;

/// Binds a feed provider to one owner's key and topic.
///
/// There is a single writer per feed: whoever holds the key. Two
///  instances sharing a key and saving concurrently will both compute
///  the same next index and the last write wins; nothing here detects
///  or resolves that.
#[derive(Debug, Clone)]
pub struct FeedSync<F> {
    provider: F,
    signer: SecretKey,
    topic: Topic,
}

impl<F: FeedProvider> FeedSync<F> {
    pub fn new(provider: F, signer: SecretKey, topic: Topic) -> Self {
        Self {
            provider,
            signer,
            topic,
        }
    }

    pub fn owner(&self) -> PublicKey {
        self.signer.public()
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn provider(&self) -> &F {
        &self.provider
    }

    /// Current pointer of `owner`'s feed, None if it was never written
    pub async fn read_pointer(&self, owner: &PublicKey) -> Result<Option<FeedUpdate>, FeedError> {
        let update = self.provider.latest(owner, &self.topic).await?;
        match &update {
            Some(update) => tracing::debug!(
                "feed {} / {} at index {} -> {}",
                owner,
                self.topic,
                update.index,
                update.reference
            ),
            None => tracing::debug!("feed {} / {} has no updates", owner, self.topic),
        }
        Ok(update)
    }

    pub async fn read_own_pointer(&self) -> Result<Option<FeedUpdate>, FeedError> {
        self.read_pointer(&self.owner()).await
    }

    /// Point our own feed at `reference`
    pub async fn write_pointer(
        &self,
        stamp: &PaymentStamp,
        reference: &Reference,
    ) -> Result<FeedUpdate, FeedError> {
        let update = self
            .provider
            .publish(&self.signer, &self.topic, stamp, reference)
            .await?;
        tracing::info!(
            "feed {} / {} updated to index {} -> {}",
            self.owner(),
            self.topic,
            update.index,
            update.reference
        );
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::MemoryFeedProvider;

    #[tokio::test]
    async fn test_write_then_read_own_pointer() {
        let sync = FeedSync::new(
            MemoryFeedProvider::new(),
            SecretKey::generate(),
            Topic::default(),
        );
        assert!(sync.read_own_pointer().await.unwrap().is_none());

        let stamp = PaymentStamp::new("stamp");
        sync.write_pointer(&stamp, &Reference::from([1u8; 32]))
            .await
            .unwrap();
        let update = sync
            .write_pointer(&stamp, &Reference::from([2u8; 32]))
            .await
            .unwrap();

        assert_eq!(sync.read_own_pointer().await.unwrap(), Some(update));
    }

    #[tokio::test]
    async fn test_read_someone_elses_pointer() {
        let provider = MemoryFeedProvider::new();
        let alice = FeedSync::new(provider.clone(), SecretKey::generate(), Topic::default());
        let bob = FeedSync::new(provider, SecretKey::generate(), Topic::default());

        let stamp = PaymentStamp::new("stamp");
        alice
            .write_pointer(&stamp, &Reference::from([4u8; 32]))
            .await
            .unwrap();

        let seen = bob.read_pointer(&alice.owner()).await.unwrap().unwrap();
        assert_eq!(seen.reference, Reference::from([4u8; 32]));
        assert!(bob.read_own_pointer().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_shared_key_last_write_wins() {
        let provider = MemoryFeedProvider::new();
        let key = SecretKey::generate();
        let one = FeedSync::new(provider.clone(), key.clone(), Topic::default());
        let two = FeedSync::new(provider, key, Topic::default());
        let stamp = PaymentStamp::new("stamp");

        one.write_pointer(&stamp, &Reference::from([1u8; 32]))
            .await
            .unwrap();
        two.write_pointer(&stamp, &Reference::from([2u8; 32]))
            .await
            .unwrap();

        let latest = one.read_own_pointer().await.unwrap().unwrap();
        assert_eq!(latest.reference, Reference::from([2u8; 32]));
        assert_eq!(latest.index, 1);
    }
}
