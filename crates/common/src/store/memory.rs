use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use super::provider::{ContentStore, ContentStoreError, FetchedData, PaymentStamp, StoreOptions};
use crate::reference::Reference;

/// In-memory content store, content addressed with BLAKE3.
///  Clones share the same underlying store.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentStore {
    inner: Arc<RwLock<MemoryContentStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryContentStoreInner {
    blobs: HashMap<Reference, FetchedData>,
    pinned: BTreeSet<Reference>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the content stored under `reference`, leaving any pin
    ///  on it in place. Returns whether there was content to drop.
    pub fn remove(&self, reference: &Reference) -> Result<bool, ContentStoreError> {
        let mut inner = self.inner.write().map_err(|e| {
            ContentStoreError::Default(anyhow::anyhow!("failed to acquire write lock: {}", e))
        })?;
        Ok(inner.blobs.remove(reference).is_some())
    }

    /// Pin a reference without storing anything under it
    pub fn pin(&self, reference: Reference) -> Result<(), ContentStoreError> {
        let mut inner = self.inner.write().map_err(|e| {
            ContentStoreError::Default(anyhow::anyhow!("failed to acquire write lock: {}", e))
        })?;
        inner.pinned.insert(reference);
        Ok(())
    }

    pub fn len(&self) -> Result<usize, ContentStoreError> {
        let inner = self.inner.read().map_err(|e| {
            ContentStoreError::Default(anyhow::anyhow!("failed to acquire read lock: {}", e))
        })?;
        Ok(inner.blobs.len())
    }

    pub fn is_empty(&self) -> Result<bool, ContentStoreError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn store(
        &self,
        stamp: &PaymentStamp,
        data: Bytes,
        name: &str,
        options: StoreOptions,
    ) -> Result<Reference, ContentStoreError> {
        if stamp.as_str().is_empty() {
            return Err(ContentStoreError::InvalidStamp(stamp.to_string()));
        }

        let reference = Reference::from_content(&data);
        let mut inner = self.inner.write().map_err(|e| {
            ContentStoreError::Default(anyhow::anyhow!("failed to acquire write lock: {}", e))
        })?;

        inner.blobs.insert(
            reference.clone(),
            FetchedData {
                data,
                name: Some(name.to_string()),
                content_type: options.content_type,
            },
        );
        if options.pin {
            inner.pinned.insert(reference.clone());
        }

        Ok(reference)
    }

    async fn fetch(&self, reference: &Reference) -> Result<FetchedData, ContentStoreError> {
        let inner = self.inner.read().map_err(|e| {
            ContentStoreError::Default(anyhow::anyhow!("failed to acquire read lock: {}", e))
        })?;

        inner
            .blobs
            .get(reference)
            .cloned()
            .ok_or_else(|| ContentStoreError::NotFound(reference.clone()))
    }

    async fn list_pinned(&self) -> Result<Vec<Reference>, ContentStoreError> {
        let inner = self.inner.read().map_err(|e| {
            ContentStoreError::Default(anyhow::anyhow!("failed to acquire read lock: {}", e))
        })?;

        Ok(inner.pinned.iter().cloned().collect())
    }
}
