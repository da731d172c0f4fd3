use std::collections::btree_map::Entry;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::Serialize;

use crate::reference::Reference;
use crate::store::ContentStoreError;

use super::metadata::FileMetadata;
use super::node::{common_prefix_len, Fork, Node, NodeCodecError, NodeRecord};
use super::path::{
    basename, decode_path, encode_path, normalize_path, PathError, PATH_SEPARATOR,
    PATH_SEPARATOR_BYTE,
};

/// Deepest chain of nodes we will follow while loading a trie.
///  Every fork consumes at least one byte of path, so this also
///  bounds the length of any path we can load.
pub const MAX_LOAD_DEPTH: usize = 4096;

#[derive(Debug, thiserror::Error)]
pub enum TrieError {
    #[error("path segment not found: {segment}")]
    PathNotFound { segment: String },
    #[error("path is not a file: {path}")]
    NotAFile { path: String },
    #[error("cannot add a file at an empty path")]
    EmptyPath,
    #[error("manifest nesting exceeds {0} nodes")]
    TooDeep(usize),
    #[error("path error: {0}")]
    Path(#[from] PathError),
    #[error("node codec error: {0}")]
    Codec(#[from] NodeCodecError),
    #[error("node store error: {0}")]
    Store(#[from] ContentStoreError),
}

/// Where trie nodes go when the trie is saved, and where they
///  come from when it is loaded.
#[async_trait]
pub trait NodeStore: Send + Sync {
    async fn put_node(&self, data: Vec<u8>) -> Result<Reference, ContentStoreError>;
    async fn get_node(&self, reference: &Reference) -> Result<Vec<u8>, ContentStoreError>;
}

/// A listed file, with its metadata when it was asked for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FileMetadata>,
}

/// Everything a value node holds, along with its logical path
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub path: String,
    pub reference: Reference,
    pub metadata: FileMetadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFile {
    pub reference: Reference,
    pub metadata: FileMetadata,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestTrie {
    root: Node,
}

impl ManifestTrie {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Reference of the root as of the last save or load,
    ///  None if the trie changed since
    pub fn root_reference(&self) -> Option<&Reference> {
        self.root.saved_reference()
    }

    pub fn is_dirty(&self) -> bool {
        !self.root.is_saved()
    }

    /// Add a file at `path`, replacing whatever reference was there.
    ///
    /// Re-adding an existing path merges the metadata (see
    ///  [`FileMetadata::merge_for_override`]). New files keep their
    ///  metadata as given, with `Filename` defaulting to the basename.
    pub fn add_fork(
        &mut self,
        path: &str,
        reference: Reference,
        metadata: FileMetadata,
    ) -> Result<(), TrieError> {
        let path = normalize_path(path);
        if path.is_empty() {
            return Err(TrieError::EmptyPath);
        }
        tracing::debug!("adding fork {} -> {}", path, reference);

        let key = encode_path(&path);
        let mut rest: &[u8] = &key;
        let mut node = &mut self.root;
        loop {
            let current = node;
            current.mark_dirty();

            if rest.is_empty() {
                let metadata = match current.take_metadata() {
                    Some(existing) if current.is_value() => {
                        existing.merge_for_override(metadata, &path)
                    }
                    _ => with_default_filename(metadata, &path),
                };
                current.set_value(reference, metadata);
                return Ok(());
            }

            let fork = match current.forks_mut().entry(rest[0]) {
                Entry::Vacant(slot) => {
                    let leaf = Node::leaf(reference, with_default_filename(metadata, &path));
                    slot.insert(Fork::new(rest.to_vec(), leaf));
                    return Ok(());
                }
                Entry::Occupied(slot) => slot.into_mut(),
            };

            let common = common_prefix_len(fork.prefix(), rest);
            if common < fork.prefix().len() {
                fork.split(common);
            }
            rest = &rest[common..];
            node = fork.node_mut();
        }
    }

    /// Look up the file stored at `path`
    pub fn resolve_path(&self, path: &str) -> Result<ResolvedFile, TrieError> {
        let path = normalize_path(path);
        let (node, _) = self.walk(&path)?;
        match (node.entry(), node.metadata()) {
            (Some(reference), metadata) => Ok(ResolvedFile {
                reference: reference.clone(),
                metadata: metadata.cloned().unwrap_or_default(),
            }),
            (None, _) => Err(TrieError::NotAFile { path }),
        }
    }

    /// Remove the file at `path`, returning the reference it pointed at
    pub fn remove_path(&mut self, path: &str) -> Result<Reference, TrieError> {
        let path = normalize_path(path);
        let (_, chain) = self.walk(&path)?;
        let not_found = || TrieError::PathNotFound {
            segment: basename(&path).to_string(),
        };

        // every node on the way down changes
        let mut node = &mut self.root;
        for key in &chain {
            node.mark_dirty();
            node = node.forks_mut().get_mut(key).ok_or_else(not_found)?.node_mut();
        }
        let removed = node.clear_value().ok_or_else(not_found)?;
        let orphaned = node.forks().is_empty();

        // restore the radix shape around the removed value
        if let Some((last, parents)) = chain.split_last() {
            let parent = node_at_mut(&mut self.root, parents).ok_or_else(not_found)?;
            if orphaned {
                parent.forks_mut().remove(last);
                if let Some((parent_key, grand)) = parents.split_last() {
                    let grandparent =
                        node_at_mut(&mut self.root, grand).ok_or_else(not_found)?;
                    grandparent.compact_fork(*parent_key);
                }
            } else {
                parent.compact_fork(*last);
            }
        }

        tracing::debug!("removed fork {} -> {}", path, removed);
        Ok(removed)
    }

    /// Every file in the trie. Order is unspecified.
    pub fn list_all(&self, include_metadata: bool) -> Result<Vec<FileEntry>, TrieError> {
        Ok(self
            .entries()?
            .into_iter()
            .map(|entry| FileEntry {
                path: entry.path,
                metadata: include_metadata.then_some(entry.metadata),
            })
            .collect())
    }

    /// Every value node along with its path. Order is unspecified.
    pub fn entries(&self) -> Result<Vec<ManifestEntry>, TrieError> {
        let mut entries = Vec::new();
        let mut stack: Vec<(Vec<u8>, &Node)> = vec![(Vec::new(), &self.root)];

        while let Some((prefix, node)) = stack.pop() {
            if let Some(reference) = node.entry() {
                entries.push(ManifestEntry {
                    path: decode_path(&prefix)?,
                    reference: reference.clone(),
                    metadata: node.metadata().cloned().unwrap_or_default(),
                });
            }
            for fork in node.forks().values() {
                let mut path = prefix.clone();
                path.extend_from_slice(fork.prefix());
                stack.push((path, fork.node()));
            }
        }

        Ok(entries)
    }

    /// Whether any file in the trie points at `reference`
    pub fn contains_reference(&self, reference: &Reference) -> bool {
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if node.entry() == Some(reference) {
                return true;
            }
            stack.extend(node.forks().values().map(Fork::node));
        }
        false
    }

    /// Number of files in the trie
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if node.is_value() {
                count += 1;
            }
            stack.extend(node.forks().values().map(Fork::node));
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.root.forks().is_empty() && !self.root.is_value()
    }

    /// Write every unsaved node to `store` and return the root reference.
    ///  Nodes that have not changed since they were last saved or loaded
    ///  are not written again.
    pub async fn save<S>(&mut self, store: &S) -> Result<Reference, TrieError>
    where
        S: NodeStore + ?Sized,
    {
        let reference = save_node(&mut self.root, store).await?;
        tracing::debug!("saved manifest root {}", reference);
        Ok(reference)
    }

    /// Replace the in-memory trie with the one saved under `root`
    pub async fn load<S>(&mut self, store: &S, root: &Reference) -> Result<(), TrieError>
    where
        S: NodeStore + ?Sized,
    {
        tracing::debug!("loading manifest root {}", root);
        self.root = load_node(root.clone(), store, 0).await?;
        Ok(())
    }

    /// Load a trie from `root`
    pub async fn open<S>(store: &S, root: &Reference) -> Result<Self, TrieError>
    where
        S: NodeStore + ?Sized,
    {
        let mut trie = Self::new();
        trie.load(store, root).await?;
        Ok(trie)
    }

    /// Walk to the node stored at an already normalized path, returning
    ///  it along with the first byte of every fork taken to get there
    fn walk(&self, path: &str) -> Result<(&Node, Vec<u8>), TrieError> {
        let key = encode_path(path);
        if key.is_empty() {
            return Err(TrieError::NotAFile {
                path: path.to_string(),
            });
        }

        let mut node = &self.root;
        let mut chain = Vec::new();
        let mut offset = 0;
        loop {
            if offset == key.len() {
                if node.is_value() {
                    return Ok((node, chain));
                }
                if node.fork(PATH_SEPARATOR_BYTE).is_some() {
                    return Err(TrieError::NotAFile {
                        path: path.to_string(),
                    });
                }
                return Err(not_found(path, offset - 1));
            }

            let remaining = &key[offset..];
            let Some(fork) = node.fork(remaining[0]) else {
                // a file has no children: name the segment asked for below it
                if node.is_value() && remaining[0] == PATH_SEPARATOR_BYTE {
                    return Err(not_found(path, offset + 1));
                }
                return Err(not_found(path, offset));
            };

            let prefix = fork.prefix();
            let common = common_prefix_len(prefix, remaining);
            if common < prefix.len() {
                if common == remaining.len() {
                    // the path ends part way through this fork
                    if prefix[common] == PATH_SEPARATOR_BYTE {
                        return Err(TrieError::NotAFile {
                            path: path.to_string(),
                        });
                    }
                    return Err(not_found(path, offset + common - 1));
                }
                return Err(not_found(path, offset + common));
            }

            chain.push(remaining[0]);
            offset += common;
            node = fork.node();
        }
    }
}

fn with_default_filename(mut metadata: FileMetadata, path: &str) -> FileMetadata {
    if metadata.filename.is_none() {
        metadata.filename = Some(basename(path).to_string());
    }
    metadata
}

/// The path segment containing byte `at`. A separator belongs
///  to the segment before it.
fn segment_at(path: &str, at: usize) -> &str {
    let mut start = 0;
    for segment in path.split(PATH_SEPARATOR) {
        let end = start + segment.len();
        if at <= end {
            return segment;
        }
        start = end + 1;
    }
    basename(path)
}

fn not_found(path: &str, at: usize) -> TrieError {
    TrieError::PathNotFound {
        segment: segment_at(path, at).to_string(),
    }
}

fn node_at_mut<'a>(root: &'a mut Node, chain: &[u8]) -> Option<&'a mut Node> {
    let mut node = root;
    for key in chain {
        node = node.forks_mut().get_mut(key)?.node_mut();
    }
    Some(node)
}

fn save_node<'a, S>(node: &'a mut Node, store: &'a S) -> BoxFuture<'a, Result<Reference, TrieError>>
where
    S: NodeStore + ?Sized,
{
    Box::pin(async move {
        if let Some(reference) = node.saved_reference() {
            return Ok(reference.clone());
        }

        for fork in node.forks_mut().values_mut() {
            save_node(fork.node_mut(), store).await?;
        }

        let record = node.to_record()?;
        let reference = store.put_node(record.encode()?).await?;
        node.mark_saved(reference.clone());
        Ok(reference)
    })
}

fn load_node<'a, S>(
    reference: Reference,
    store: &'a S,
    depth: usize,
) -> BoxFuture<'a, Result<Node, TrieError>>
where
    S: NodeStore + ?Sized,
{
    Box::pin(async move {
        if depth > MAX_LOAD_DEPTH {
            return Err(TrieError::TooDeep(MAX_LOAD_DEPTH));
        }

        let data = store.get_node(&reference).await?;
        let record = NodeRecord::decode(&data)?;

        let mut children = Vec::with_capacity(record.forks.len());
        for fork in &record.forks {
            children.push(load_node(fork.node.clone(), store, depth + 1).await?);
        }

        Ok(Node::from_record(&record, reference, children)?)
    })
}
