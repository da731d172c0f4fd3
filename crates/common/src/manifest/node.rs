use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::reference::Reference;

use super::metadata::FileMetadata;

/**
 * Nodes
 * =====
 * The manifest is a radix trie over encoded path bytes.
 *  Each node may carry a value (a content reference plus its file
 *   metadata), and owns a set of forks to child nodes.
 *  A fork is labeled with a byte prefix; siblings never share the
 *   first byte of their prefix, so forks are keyed by that byte.
 *  Concatenating the prefixes walked from the root to a value node
 *   yields the file's logical path.
 * Nodes remember the reference they were last saved under. Any
 *  mutation below a node clears it, which is how save knows which
 *  parts of the trie need to be written again.
 */

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    entry: Option<Reference>,
    metadata: Option<FileMetadata>,
    forks: BTreeMap<u8, Fork>,
    // reference this node was last saved or loaded under,
    //  None while the node has unsaved changes
    saved: Option<Reference>,
}

// An edge to a child node, labeled by a non-empty byte prefix
#[derive(Debug, Clone, PartialEq)]
pub struct Fork {
    prefix: Vec<u8>,
    node: Node,
}

#[derive(Debug, thiserror::Error)]
pub enum NodeCodecError {
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("metadata json error: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("fork prefix is empty")]
    EmptyPrefix,
    #[error("more than one fork starts with byte {0:#04x}")]
    DuplicateFork(u8),
    #[error("fork {0:#04x} has not been saved")]
    UnsavedChild(u8),
}

/// What a node looks like once it leaves the process.
///  Children are replaced by the references they were saved under,
///  and metadata travels as a JSON string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub entry: Option<Reference>,
    pub metadata: Option<String>,
    pub forks: Vec<ForkRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForkRecord {
    pub prefix: Vec<u8>,
    pub node: Reference,
}

impl NodeRecord {
    pub fn encode(&self) -> Result<Vec<u8>, NodeCodecError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self, NodeCodecError> {
        let record: NodeRecord = bincode::deserialize(data)?;
        for fork in &record.forks {
            if fork.prefix.is_empty() {
                return Err(NodeCodecError::EmptyPrefix);
            }
        }
        Ok(record)
    }

    pub fn metadata(&self) -> Result<Option<FileMetadata>, NodeCodecError> {
        match &self.metadata {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }
}

impl Fork {
    pub fn new(prefix: Vec<u8>, node: Node) -> Self {
        Fork { prefix, node }
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut Node {
        &mut self.node
    }

    /// Cut this fork after `at` bytes, pushing the tail of the prefix
    ///  (and the old child) one level down under a new intermediate node.
    pub(crate) fn split(&mut self, at: usize) {
        debug_assert!(at > 0 && at < self.prefix.len());
        let tail = self.prefix.split_off(at);
        let child = std::mem::take(&mut self.node);
        let mut intermediate = Node::default();
        intermediate.forks.insert(tail[0], Fork::new(tail, child));
        self.node = intermediate;
    }
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    /// A value node with no children
    pub fn leaf(entry: Reference, metadata: FileMetadata) -> Self {
        Node {
            entry: Some(entry),
            metadata: Some(metadata),
            forks: BTreeMap::new(),
            saved: None,
        }
    }

    pub fn entry(&self) -> Option<&Reference> {
        self.entry.as_ref()
    }

    pub fn metadata(&self) -> Option<&FileMetadata> {
        self.metadata.as_ref()
    }

    pub fn is_value(&self) -> bool {
        self.entry.is_some()
    }

    pub fn forks(&self) -> &BTreeMap<u8, Fork> {
        &self.forks
    }

    pub fn fork(&self, first: u8) -> Option<&Fork> {
        self.forks.get(&first)
    }

    pub(crate) fn forks_mut(&mut self) -> &mut BTreeMap<u8, Fork> {
        &mut self.forks
    }

    pub fn saved_reference(&self) -> Option<&Reference> {
        self.saved.as_ref()
    }

    pub fn is_saved(&self) -> bool {
        self.saved.is_some()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.saved = None;
    }

    pub(crate) fn mark_saved(&mut self, reference: Reference) {
        self.saved = Some(reference);
    }

    /// Set the value carried by this node, returning the previous one
    pub(crate) fn set_value(
        &mut self,
        entry: Reference,
        metadata: FileMetadata,
    ) -> Option<(Reference, Option<FileMetadata>)> {
        self.mark_dirty();
        let previous = self.entry.replace(entry);
        let previous_metadata = self.metadata.replace(metadata);
        previous.map(|entry| (entry, previous_metadata))
    }

    pub(crate) fn take_metadata(&mut self) -> Option<FileMetadata> {
        self.metadata.take()
    }

    pub(crate) fn clear_value(&mut self) -> Option<Reference> {
        self.mark_dirty();
        self.metadata = None;
        self.entry.take()
    }

    /// Merge the fork under `key` with its only child when the fork's
    ///  node carries no value of its own, keeping the trie compact
    ///  after a removal.
    pub(crate) fn compact_fork(&mut self, key: u8) {
        let mergeable = self
            .forks
            .get(&key)
            .map(|fork| !fork.node.is_value() && fork.node.forks.len() == 1)
            .unwrap_or(false);
        if !mergeable {
            return;
        }
        if let Some(mut fork) = self.forks.remove(&key) {
            let grandchildren = std::mem::take(&mut fork.node.forks);
            if let Some((_, child)) = grandchildren.into_iter().next() {
                fork.prefix.extend(child.prefix);
                self.forks.insert(key, Fork::new(fork.prefix, child.node));
            }
        }
        self.mark_dirty();
    }

    /// Build the wire record for this node. Every child must already
    ///  be saved.
    pub(crate) fn to_record(&self) -> Result<NodeRecord, NodeCodecError> {
        let mut forks = Vec::with_capacity(self.forks.len());
        for (key, fork) in &self.forks {
            let reference = fork
                .node
                .saved_reference()
                .ok_or(NodeCodecError::UnsavedChild(*key))?;
            forks.push(ForkRecord {
                prefix: fork.prefix.clone(),
                node: reference.clone(),
            });
        }
        let metadata = match &self.metadata {
            Some(metadata) => Some(serde_json::to_string(metadata)?),
            None => None,
        };
        Ok(NodeRecord {
            entry: self.entry.clone(),
            metadata,
            forks,
        })
    }

    /// Rebuild a node from its record and already loaded children
    ///  (in the same order as the record's forks).
    pub(crate) fn from_record(
        record: &NodeRecord,
        reference: Reference,
        children: Vec<Node>,
    ) -> Result<Self, NodeCodecError> {
        let mut forks = BTreeMap::new();
        for (fork, child) in record.forks.iter().zip(children) {
            let key = fork.prefix[0];
            if forks
                .insert(key, Fork::new(fork.prefix.clone(), child))
                .is_some()
            {
                return Err(NodeCodecError::DuplicateFork(key));
            }
        }
        Ok(Node {
            entry: record.entry.clone(),
            metadata: record.metadata()?,
            forks,
            saved: Some(reference),
        })
    }
}

/// Length of the common prefix of two byte strings
pub(crate) fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
mod test {
    use super::*;

    fn reference(byte: u8) -> Reference {
        Reference::from([byte; 32])
    }

    #[test]
    fn test_record_encode_decode() {
        let record = NodeRecord {
            entry: Some(reference(1)),
            metadata: Some(r#"{"Filename":"a.txt"}"#.to_string()),
            forks: vec![ForkRecord {
                prefix: b"dir/".to_vec(),
                node: reference(2),
            }],
        };

        let encoded = record.encode().unwrap();
        let decoded = NodeRecord::decode(&encoded).unwrap();
        assert_eq!(record, decoded);
        assert_eq!(
            decoded.metadata().unwrap().unwrap().filename.as_deref(),
            Some("a.txt")
        );
    }

    #[test]
    fn test_record_encoding_is_deterministic() {
        let record = NodeRecord {
            entry: None,
            metadata: None,
            forks: vec![],
        };
        assert_eq!(record.encode().unwrap(), record.encode().unwrap());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(NodeRecord::decode(&[0xff; 3]).is_err());
    }

    #[test]
    fn test_split_fork() {
        let leaf = Node::leaf(reference(1), FileMetadata::default());
        let mut fork = Fork::new(b"abc".to_vec(), leaf.clone());
        fork.split(1);

        assert_eq!(fork.prefix(), b"a");
        let tail = fork.node().fork(b'b').unwrap();
        assert_eq!(tail.prefix(), b"bc");
        assert_eq!(tail.node(), &leaf);
        assert!(!fork.node().is_value());
    }

    #[test]
    fn test_to_record_requires_saved_children() {
        let mut node = Node::new();
        node.forks.insert(
            b'a',
            Fork::new(b"a".to_vec(), Node::leaf(reference(1), FileMetadata::default())),
        );
        assert!(matches!(
            node.to_record(),
            Err(NodeCodecError::UnsavedChild(b'a'))
        ));

        node.forks
            .get_mut(&b'a')
            .unwrap()
            .node
            .mark_saved(reference(9));
        let record = node.to_record().unwrap();
        assert_eq!(record.forks.len(), 1);
        assert_eq!(record.forks[0].node, reference(9));
    }

    #[test]
    fn test_compact_fork() {
        let leaf = Node::leaf(reference(1), FileMetadata::default());
        let mut root = Node::new();
        root.forks.insert(b'a', Fork::new(b"abc".to_vec(), leaf.clone()));
        root.forks.get_mut(&b'a').unwrap().split(1);

        root.compact_fork(b'a');

        let fork = root.fork(b'a').unwrap();
        assert_eq!(fork.prefix(), b"abc");
        assert_eq!(fork.node(), &leaf);
    }

    #[test]
    fn test_common_prefix_len() {
        assert_eq!(common_prefix_len(b"file/1.txt", b"file/2.txt"), 5);
        assert_eq!(common_prefix_len(b"abc", b"xyz"), 0);
        assert_eq!(common_prefix_len(b"ab", b"abc"), 2);
    }
}
