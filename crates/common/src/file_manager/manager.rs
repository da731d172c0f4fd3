use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use serde::Serialize;

use super::config::{FileManagerConfig, UploadOptions};
use super::directory::DirectoryTree;
use super::search::SearchCriteria;
use crate::crypto::PublicKey;
use crate::feed::{FeedError, FeedProvider, FeedSync, FeedUpdate};
use crate::manifest::{
    basename, normalize_path, FileEntry, FileMetadata, ManifestTrie, MetadataInput, TrieError,
};
use crate::reference::Reference;
use crate::settle::settle_all;
use crate::store::{
    ContentNodeStore, ContentStore, ContentStoreError, PaymentStamp, RedundancyLevel,
    StoreOptions, MANIFEST_NODE_NAME,
};

#[derive(Debug, thiserror::Error)]
pub enum FileManagerError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("manifest error: {0}")]
    Trie(#[from] TrieError),
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),
    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("failed to upload {path}: {source}")]
    Upload {
        path: String,
        #[source]
        source: ContentStoreError,
    },
    #[error("failed to download {reference}: {source}")]
    Download {
        reference: Reference,
        #[source]
        source: ContentStoreError,
    },
    #[error("failed to list pinned references: {0}")]
    ListPinned(#[source] ContentStoreError),
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where an imported reference came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportOrigin {
    /// Handed to us by the caller
    Local,
    /// Found in the node's pinned set
    Pinned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedFile {
    pub reference: Reference,
    pub path: String,
    pub origin: ImportOrigin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedFile {
    pub path: String,
    pub data: Bytes,
    pub metadata: FileMetadata,
}

/// Keeps a manifest of files stored in a content store, anchored
///  by a feed owned by the configured key.
///
/// Mutations go through `&mut self`; callers sharing a manager across
///  tasks have to serialize them. Read operations take the trie to
///  read explicitly, pass [`FileManager::trie`] for our own.
#[derive(Debug)]
pub struct FileManager<C, F> {
    content: C,
    feed: FeedSync<F>,
    redundancy_level: RedundancyLevel,
    trie: ManifestTrie,
    imported: Vec<ImportedFile>,
}

impl<C, F> FileManager<C, F>
where
    C: ContentStore,
    F: FeedProvider,
{
    pub fn new(content: C, feeds: F, config: FileManagerConfig) -> Result<Self, FileManagerError> {
        let secret_key = config.secret_key.ok_or_else(|| {
            FileManagerError::Configuration("a secret key is required to own the feed".to_string())
        })?;

        Ok(Self {
            content,
            feed: FeedSync::new(feeds, secret_key, config.topic),
            redundancy_level: config.redundancy_level,
            trie: ManifestTrie::new(),
            imported: Vec::new(),
        })
    }

    pub fn owner(&self) -> PublicKey {
        self.feed.owner()
    }

    pub fn trie(&self) -> &ManifestTrie {
        &self.trie
    }

    pub fn content_store(&self) -> &C {
        &self.content
    }

    pub fn feed(&self) -> &FeedSync<F> {
        &self.feed
    }

    pub fn imported_files(&self) -> &[ImportedFile] {
        &self.imported
    }

    /// Load the trie our feed points at, then import `seed` (or the
    ///  pinned set when there is no seed) and save if anything was imported.
    pub async fn initialize(
        &mut self,
        stamp: &PaymentStamp,
        seed: Option<Vec<Reference>>,
    ) -> Result<Vec<ImportedFile>, FileManagerError> {
        self.load_from_feed().await?;

        let imported = match self.import_file_references(seed).await {
            Ok(imported) => imported,
            Err(e) => {
                tracing::error!("failed to import file references: {}", e);
                return Err(e);
            }
        };

        if !imported.is_empty() {
            self.save_trie(stamp).await?;
        }
        Ok(imported)
    }

    /// Replace the instance trie with the one our feed points at.
    ///  A feed that was never written leaves an empty trie.
    pub async fn load_from_feed(&mut self) -> Result<Option<FeedUpdate>, FileManagerError> {
        let Some(update) = self.feed.read_own_pointer().await? else {
            tracing::info!("no manifest published for {} yet", self.owner());
            self.trie = ManifestTrie::new();
            return Ok(None);
        };

        let store = ContentNodeStore::read_only(&self.content);
        self.trie = ManifestTrie::open(&store, &update.reference).await?;
        tracing::info!(
            "loaded manifest {} (index {}) with {} files",
            update.reference,
            update.index,
            self.trie.len()
        );
        Ok(Some(update))
    }

    /// Save the instance trie and point our feed at its root
    pub async fn save_trie(&mut self, stamp: &PaymentStamp) -> Result<FeedUpdate, FileManagerError> {
        let store = ContentNodeStore::stamped(&self.content, stamp, self.redundancy_level);
        let root = self.trie.save(&store).await?;
        Ok(self.feed.write_pointer(stamp, &root).await?)
    }

    pub fn add_to_trie(
        &mut self,
        path: &str,
        reference: Reference,
        metadata: FileMetadata,
    ) -> Result<(), FileManagerError> {
        Ok(self.trie.add_fork(path, reference, metadata)?)
    }

    /// Drop `path` from the instance trie. The content stays in the store.
    pub fn remove_file(&mut self, path: &str) -> Result<Reference, FileManagerError> {
        Ok(self.trie.remove_path(path)?)
    }

    /// Upload a local file into the instance trie
    pub async fn upload_file(
        &mut self,
        stamp: &PaymentStamp,
        file_path: impl AsRef<Path>,
        options: UploadOptions,
    ) -> Result<Reference, FileManagerError> {
        let file_path = file_path.as_ref();
        let data = read_file(file_path).await?;
        let logical_path = logical_path_for(file_path, &options);
        self.upload_data(stamp, data, &logical_path, options).await
    }

    /// Upload bytes into the instance trie at `logical_path`
    pub async fn upload_data(
        &mut self,
        stamp: &PaymentStamp,
        data: Bytes,
        logical_path: &str,
        options: UploadOptions,
    ) -> Result<Reference, FileManagerError> {
        let reference = store_and_add(
            &self.content,
            &mut self.trie,
            stamp,
            data,
            logical_path,
            &options,
            self.redundancy_level,
        )
        .await?;

        if options.auto_save {
            self.save_trie(stamp).await?;
        }
        Ok(reference)
    }

    /// Upload a local file into `trie` rather than the instance trie.
    ///  Nothing is saved; `auto_save` is ignored.
    pub async fn upload_file_to(
        &self,
        trie: &mut ManifestTrie,
        stamp: &PaymentStamp,
        file_path: impl AsRef<Path>,
        options: UploadOptions,
    ) -> Result<Reference, FileManagerError> {
        let file_path = file_path.as_ref();
        let data = read_file(file_path).await?;
        let logical_path = logical_path_for(file_path, &options);
        store_and_add(
            &self.content,
            trie,
            stamp,
            data,
            &logical_path,
            &options,
            self.redundancy_level,
        )
        .await
    }

    pub async fn download_file(
        &self,
        trie: &ManifestTrie,
        path: &str,
    ) -> Result<DownloadedFile, FileManagerError> {
        let resolved = trie.resolve_path(path)?;
        let fetched = self
            .content
            .fetch(&resolved.reference)
            .await
            .map_err(|source| FileManagerError::Download {
                reference: resolved.reference.clone(),
                source,
            })?;

        Ok(DownloadedFile {
            path: normalize_path(path),
            data: fetched.data,
            metadata: resolved.metadata,
        })
    }

    /// Download every file in `trie`, leaving out the ones that fail.
    ///
    /// # Returns
    /// * `Ok(None)` - The trie holds no files at all
    /// * `Ok(Some(files))` - Every file that could be fetched, sorted by
    ///   path; empty when all of them failed
    pub async fn download_files(
        &self,
        trie: &ManifestTrie,
    ) -> Result<Option<Vec<DownloadedFile>>, FileManagerError> {
        let entries = trie.entries()?;
        if entries.is_empty() {
            return Ok(None);
        }

        let content = &self.content;
        let tasks = entries.into_iter().map(|entry| {
            let key = entry.path.clone();
            let task = async move {
                let fetched = content.fetch(&entry.reference).await?;
                Ok::<_, ContentStoreError>(DownloadedFile {
                    path: entry.path,
                    data: fetched.data,
                    metadata: entry.metadata,
                })
            };
            (key, task)
        });

        let mut files = settle_all("download", tasks).await.successes;
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(Some(files))
    }

    /// Import content references into the instance trie.
    ///
    /// With `items` they are imported as local files; without, every
    ///  reference in the content store's pinned set is imported and
    ///  flagged `pinned`. References already in the trie are skipped,
    ///  and one that can't be fetched is logged and left out.
    pub async fn import_file_references(
        &mut self,
        items: Option<Vec<Reference>>,
    ) -> Result<Vec<ImportedFile>, FileManagerError> {
        let (origin, references) = match items {
            Some(references) => (ImportOrigin::Local, references),
            None => (
                ImportOrigin::Pinned,
                self.content
                    .list_pinned()
                    .await
                    .map_err(FileManagerError::ListPinned)?,
            ),
        };

        let mut seen = HashSet::new();
        let pending: Vec<Reference> = references
            .into_iter()
            .filter(|reference| seen.insert(reference.clone()))
            .filter(|reference| !self.trie.contains_reference(reference))
            .collect();
        if pending.is_empty() {
            tracing::debug!("nothing new to import");
            return Ok(Vec::new());
        }

        let content = &self.content;
        let tasks = pending.into_iter().map(|reference| {
            let key = reference.clone();
            let task = async move {
                let fetched = content.fetch(&reference).await?;
                Ok::<_, ContentStoreError>((reference, fetched))
            };
            (key, task)
        });
        let fetched = settle_all("import", tasks).await.successes;

        let mut imported = Vec::with_capacity(fetched.len());
        for (reference, data) in fetched {
            // manifest nodes of other tries are not files
            if data.name.as_deref() == Some(MANIFEST_NODE_NAME) {
                tracing::debug!("skipping manifest node {}", reference);
                continue;
            }

            let path = self.import_path(&reference, data.name.as_deref());
            let input = MetadataInput {
                filename: data.name.clone(),
                content_type: data.content_type.clone(),
                ..Default::default()
            };
            let mut metadata = FileMetadata::build(&data.data, &path, &input)?;
            if origin == ImportOrigin::Pinned {
                metadata.pinned = Some(true);
            }

            self.trie.add_fork(&path, reference.clone(), metadata)?;
            let file = ImportedFile {
                reference,
                path,
                origin,
            };
            self.imported.push(file.clone());
            imported.push(file);
        }

        tracing::info!("imported {} {:?} references", imported.len(), origin);
        Ok(imported)
    }

    /// Path an imported reference lands at: its stored name, or its hex
    ///  when it has no usable name or the name is already a file or a
    ///  directory
    fn import_path(&self, reference: &Reference, name: Option<&str>) -> String {
        match name.map(normalize_path) {
            Some(path) if !path.is_empty() && self.is_free_path(&path) => path,
            _ => reference.to_hex(),
        }
    }

    fn is_free_path(&self, path: &str) -> bool {
        matches!(
            self.trie.resolve_path(path),
            Err(TrieError::PathNotFound { .. })
        )
    }

    pub fn list_files(
        &self,
        trie: &ManifestTrie,
        include_metadata: bool,
    ) -> Result<Vec<FileEntry>, FileManagerError> {
        Ok(trie.list_all(include_metadata)?)
    }

    /// Files whose basename contains `query` (case sensitive)
    pub fn search_files_by_name(
        &self,
        trie: &ManifestTrie,
        query: &str,
        include_metadata: bool,
    ) -> Result<Vec<FileEntry>, FileManagerError> {
        self.search_files(trie, &SearchCriteria::by_name(query), include_metadata)
    }

    /// Files matching every criterion that is set
    pub fn search_files(
        &self,
        trie: &ManifestTrie,
        criteria: &SearchCriteria,
        include_metadata: bool,
    ) -> Result<Vec<FileEntry>, FileManagerError> {
        Ok(trie
            .entries()?
            .into_iter()
            .filter(|entry| criteria.matches(entry))
            .map(|entry| FileEntry {
                path: entry.path,
                metadata: include_metadata.then_some(entry.metadata),
            })
            .collect())
    }

    /// Nested view of every path in `trie`, under a single `root_name` key
    pub fn get_directory_structure(
        &self,
        trie: &ManifestTrie,
        root_name: &str,
    ) -> Result<DirectoryTree, FileManagerError> {
        let entries = trie.entries()?;
        let tree = DirectoryTree::from_paths(entries.iter().map(|entry| entry.path.as_str()));
        Ok(tree.wrap(root_name))
    }

    /// Names directly inside the directory `target_path`. Empty, with
    ///  the condition logged, when there is no such directory.
    pub fn get_contents_of_directory(
        &self,
        target_path: &str,
        trie: &ManifestTrie,
        root_name: &str,
    ) -> Result<Vec<String>, FileManagerError> {
        let structure = self.get_directory_structure(trie, root_name)?;
        let Some(Some(root)) = structure.get(root_name) else {
            tracing::error!("root directory {} not found", root_name);
            return Ok(Vec::new());
        };

        // `./dir` and `dir` name the same directory
        match root.find(target_path) {
            Some(directory) => Ok(directory.names()),
            None => {
                tracing::error!("directory {} not found under {}", target_path, root_name);
                Ok(Vec::new())
            }
        }
    }
}

async fn read_file(path: &Path) -> Result<Bytes, FileManagerError> {
    tokio::fs::read(path)
        .await
        .map(Bytes::from)
        .map_err(|source| FileManagerError::ReadFile {
            path: path.to_path_buf(),
            source,
        })
}

/// Logical path for an upload: the explicit destination, or the
///  local path with only its normal components, `/` joined
fn logical_path_for(file_path: &Path, options: &UploadOptions) -> String {
    if let Some(destination) = &options.destination {
        return normalize_path(destination);
    }
    file_path
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Store `data` and add it to `trie`. The fork is only added once the
///  content store accepted the bytes.
async fn store_and_add<C: ContentStore + ?Sized>(
    content: &C,
    trie: &mut ManifestTrie,
    stamp: &PaymentStamp,
    data: Bytes,
    logical_path: &str,
    options: &UploadOptions,
    default_redundancy: RedundancyLevel,
) -> Result<Reference, FileManagerError> {
    let logical_path = normalize_path(logical_path);
    let input = MetadataInput {
        custom: options.custom_metadata.clone(),
        filename: options.filename.clone(),
        content_type: None,
    };
    let metadata = FileMetadata::build(&data, &logical_path, &input)?;
    let name = metadata
        .filename
        .clone()
        .unwrap_or_else(|| basename(&logical_path).to_string());

    let store_options = StoreOptions {
        content_type: metadata.content_type.clone(),
        redundancy_level: options.redundancy_level.unwrap_or(default_redundancy),
        pin: true,
    };
    let reference = content
        .store(stamp, data, &name, store_options)
        .await
        .map_err(|source| FileManagerError::Upload {
            path: logical_path.clone(),
            source,
        })?;

    trie.add_fork(&logical_path, reference.clone(), metadata)?;
    tracing::info!("uploaded {} as {}", logical_path, reference);
    Ok(reference)
}
