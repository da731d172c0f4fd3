use std::collections::BTreeMap;

use serde::Serialize;

use crate::manifest::{normalize_path, segments, PATH_SEPARATOR};

/// Root key used when the caller doesn't name one
pub const DEFAULT_ROOT_NAME: &str = "root";

/// Nested view of the manifest: directory names map to their own
///  tree, file names map to nothing (`null` once serialized)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DirectoryTree(BTreeMap<String, Option<DirectoryTree>>);

impl DirectoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the tree of a flat list of logical paths.
    ///  A name that is both a file and a directory is kept as a directory.
    pub fn from_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut tree = DirectoryTree::new();
        for path in paths {
            let parts: Vec<&str> = segments(path).collect();
            let Some((file, dirs)) = parts.split_last() else {
                continue;
            };

            let mut current = &mut tree;
            for dir in dirs {
                let slot = current.0.entry(dir.to_string()).or_insert(None);
                current = slot.get_or_insert_with(DirectoryTree::new);
            }
            current.0.entry(file.to_string()).or_insert(None);
        }
        tree
    }

    /// Wrap this tree under a single root key
    pub fn wrap(self, root_name: &str) -> Self {
        DirectoryTree(BTreeMap::from([(root_name.to_string(), Some(self))]))
    }

    pub fn get(&self, name: &str) -> Option<&Option<DirectoryTree>> {
        self.0.get(name)
    }

    /// Names directly under this directory
    pub fn names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Find the directory at `target` (relative to this tree).
    ///  An empty target is this tree itself; files are not directories.
    pub fn find(&self, target: &str) -> Option<&DirectoryTree> {
        let target = normalize_path(target);
        if target.is_empty() {
            return Some(self);
        }

        let mut worklist: Vec<(String, &DirectoryTree)> = vec![(String::new(), self)];
        while let Some((prefix, tree)) = worklist.pop() {
            for (name, child) in &tree.0 {
                let Some(child) = child else {
                    continue;
                };
                let path = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{}{}{}", prefix, PATH_SEPARATOR, name)
                };
                if path == target {
                    return Some(child);
                }
                if target.starts_with(&path) {
                    worklist.push((path, child));
                }
            }
        }
        None
    }
}
