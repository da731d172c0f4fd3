use async_trait::async_trait;
use bytes::Bytes;

use super::provider::{ContentStore, ContentStoreError, PaymentStamp, RedundancyLevel, StoreOptions};
use crate::manifest::{NodeStore, DEFAULT_CONTENT_TYPE};
use crate::reference::Reference;

/// Name trie nodes are stored under
pub const MANIFEST_NODE_NAME: &str = "manifest-node";

/// Adapts a content store into the node store a trie saves to and
///  loads from. Writes need a stamp; a read-only adapter fails them
///  with [`ContentStoreError::MissingStamp`].
///
/// Nodes are never pinned, so they don't show up in the node's
///  pinned set next to real files.
#[derive(Debug)]
pub struct ContentNodeStore<'a, C: ?Sized> {
    store: &'a C,
    stamp: Option<&'a PaymentStamp>,
    redundancy_level: RedundancyLevel,
}

impl<'a, C: ContentStore + ?Sized> ContentNodeStore<'a, C> {
    pub fn read_only(store: &'a C) -> Self {
        Self {
            store,
            stamp: None,
            redundancy_level: RedundancyLevel::default(),
        }
    }

    pub fn stamped(
        store: &'a C,
        stamp: &'a PaymentStamp,
        redundancy_level: RedundancyLevel,
    ) -> Self {
        Self {
            store,
            stamp: Some(stamp),
            redundancy_level,
        }
    }
}

#[async_trait]
impl<C: ContentStore + ?Sized> NodeStore for ContentNodeStore<'_, C> {
    async fn put_node(&self, data: Vec<u8>) -> Result<Reference, ContentStoreError> {
        let stamp = self.stamp.ok_or(ContentStoreError::MissingStamp)?;
        let options = StoreOptions {
            content_type: Some(DEFAULT_CONTENT_TYPE.to_string()),
            redundancy_level: self.redundancy_level,
            pin: false,
        };
        self.store
            .store(stamp, Bytes::from(data), MANIFEST_NODE_NAME, options)
            .await
    }

    async fn get_node(&self, reference: &Reference) -> Result<Vec<u8>, ContentStoreError> {
        Ok(self.store.fetch(reference).await?.data.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{FileMetadata, ManifestTrie};
    use crate::store::MemoryContentStore;

    #[tokio::test]
    async fn test_trie_roundtrip_through_content_store() {
        let content = MemoryContentStore::new();
        let stamp = PaymentStamp::new("stamp");
        let mut trie = ManifestTrie::new();
        trie.add_fork("a/b.txt", Reference::from([1u8; 32]), FileMetadata::default())
            .unwrap();

        let writer = ContentNodeStore::stamped(&content, &stamp, RedundancyLevel::Medium);
        let root = trie.save(&writer).await.unwrap();

        let reader = ContentNodeStore::read_only(&content);
        let loaded = ManifestTrie::open(&reader, &root).await.unwrap();
        assert_eq!(loaded.len(), 1);

        // nodes never land in the pinned set
        assert!(content.list_pinned().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_only_store_refuses_writes() {
        let content = MemoryContentStore::new();
        let reader = ContentNodeStore::read_only(&content);
        assert!(matches!(
            reader.put_node(vec![1, 2, 3]).await,
            Err(ContentStoreError::MissingStamp)
        ));
    }
}
