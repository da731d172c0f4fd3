use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::provider::{ContentStore, ContentStoreError, FetchedData, PaymentStamp, StoreOptions};
use crate::reference::Reference;

const SIDECAR_EXTENSION: &str = "json";

/// Content store backed by a local directory.
///
/// Each blob lives at `<root>/<reference hex>`, with its name, content type
///  and pin state in a `<reference hex>.json` sidecar next to it.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Sidecar {
    name: Option<String>,
    content_type: Option<String>,
    #[serde(default)]
    pinned: bool,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, reference: &Reference) -> PathBuf {
        self.root.join(reference.to_hex())
    }

    fn sidecar_path(&self, reference: &Reference) -> PathBuf {
        self.root
            .join(format!("{}.{}", reference.to_hex(), SIDECAR_EXTENSION))
    }

    async fn read_sidecar(&self, reference: &Reference) -> Result<Option<Sidecar>, ContentStoreError> {
        match tokio::fs::read(self.sidecar_path(reference)).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Drop the blob stored under `reference`, keeping its sidecar
    ///  (and therefore its pin)
    pub async fn remove(&self, reference: &Reference) -> Result<bool, ContentStoreError> {
        match tokio::fs::remove_file(self.blob_path(reference)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
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
        tokio::fs::create_dir_all(&self.root).await?;

        let reference = Reference::from_content(&data);
        let pinned = match self.read_sidecar(&reference).await? {
            Some(existing) => existing.pinned || options.pin,
            None => options.pin,
        };
        let sidecar = Sidecar {
            name: Some(name.to_string()),
            content_type: options.content_type,
            pinned,
        };

        tokio::fs::write(self.blob_path(&reference), &data).await?;
        tokio::fs::write(
            self.sidecar_path(&reference),
            serde_json::to_vec_pretty(&sidecar)?,
        )
        .await?;

        tracing::debug!(
            "stored {} bytes as {} (redundancy {})",
            data.len(),
            reference,
            options.redundancy_level
        );
        Ok(reference)
    }

    async fn fetch(&self, reference: &Reference) -> Result<FetchedData, ContentStoreError> {
        let data = match tokio::fs::read(self.blob_path(reference)).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ContentStoreError::NotFound(reference.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        let sidecar = self.read_sidecar(reference).await?.unwrap_or_default();

        Ok(FetchedData {
            data: Bytes::from(data),
            name: sidecar.name,
            content_type: sidecar.content_type,
        })
    }

    async fn list_pinned(&self) -> Result<Vec<Reference>, ContentStoreError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut pinned = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SIDECAR_EXTENSION) {
                continue;
            }
            let Some(reference) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| Reference::from_hex(stem).ok())
            else {
                tracing::warn!("ignoring unexpected file in blob store: {}", path.display());
                continue;
            };
            if let Some(sidecar) = self.read_sidecar(&reference).await? {
                if sidecar.pinned {
                    pinned.push(reference);
                }
            }
        }

        pinned.sort();
        Ok(pinned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp() -> PaymentStamp {
        PaymentStamp::new("test-stamp")
    }

    #[tokio::test]
    async fn test_store_fetch_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(dir.path().join("blobs"));

        let reference = store
            .store(
                &stamp(),
                Bytes::from_static(b"on disk"),
                "disk.txt",
                StoreOptions {
                    content_type: Some("text/plain".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let fetched = store.fetch(&reference).await.unwrap();
        assert_eq!(fetched.data, Bytes::from_static(b"on disk"));
        assert_eq!(fetched.name.as_deref(), Some("disk.txt"));
        assert_eq!(fetched.content_type.as_deref(), Some("text/plain"));

        // a second handle on the same directory sees the same content
        let reopened = FsContentStore::new(dir.path().join("blobs"));
        assert!(reopened.fetch(&reference).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(dir.path());
        let result = store.fetch(&Reference::from([3u8; 32])).await;
        assert!(matches!(result, Err(ContentStoreError::NotFound(_))));
        assert!(store.list_pinned().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pins_survive_restore_and_removal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(dir.path());

        let pinned = StoreOptions {
            pin: true,
            ..Default::default()
        };
        let reference = store
            .store(&stamp(), Bytes::from_static(b"keep"), "keep", pinned)
            .await
            .unwrap();
        // storing again unpinned must not drop the pin
        store
            .store(&stamp(), Bytes::from_static(b"keep"), "keep", StoreOptions::default())
            .await
            .unwrap();
        store
            .store(&stamp(), Bytes::from_static(b"other"), "other", StoreOptions::default())
            .await
            .unwrap();

        assert_eq!(store.list_pinned().await.unwrap(), vec![reference.clone()]);

        assert!(store.remove(&reference).await.unwrap());
        assert_eq!(store.list_pinned().await.unwrap(), vec![reference.clone()]);
        assert!(store.fetch(&reference).await.is_err());
    }
}
