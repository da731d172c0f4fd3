use std::collections::BTreeMap;

use crate::manifest::{basename, dirname, extension, ManifestEntry};

/// Filters for [`FileManager::search_files`](super::FileManager::search_files).
///  Every criterion that is set must match; unset ones are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    /// Substring of the file's basename
    pub file_name: Option<String>,
    /// Substring of the directory part of the path
    pub directory: Option<String>,
    /// Exact values for metadata keys, custom fields included
    pub metadata: BTreeMap<String, String>,
    /// Inclusive lower bound on `Content-Size`
    pub min_size: Option<u64>,
    /// Inclusive upper bound on `Content-Size`
    pub max_size: Option<u64>,
    /// Exact extension, with or without the leading dot
    pub extension: Option<String>,
}

impl SearchCriteria {
    pub fn by_name(query: impl Into<String>) -> Self {
        Self {
            file_name: Some(query.into()),
            ..Default::default()
        }
    }

    pub fn matches(&self, entry: &ManifestEntry) -> bool {
        if let Some(query) = &self.file_name {
            if !basename(&entry.path).contains(query.as_str()) {
                return false;
            }
        }

        if let Some(query) = &self.directory {
            if !dirname(&entry.path).contains(query.as_str()) {
                return false;
            }
        }

        for (key, expected) in &self.metadata {
            if entry.metadata.get(key).as_deref() != Some(expected.as_str()) {
                return false;
            }
        }

        if self.min_size.is_some() || self.max_size.is_some() {
            // files without a known size never satisfy a size bound
            let Some(size) = entry.metadata.content_size else {
                return false;
            };
            if self.min_size.is_some_and(|min| size < min) {
                return false;
            }
            if self.max_size.is_some_and(|max| size > max) {
                return false;
            }
        }

        if let Some(wanted) = &self.extension {
            let wanted = wanted.strip_prefix('.').unwrap_or(wanted);
            if extension(&entry.path) != Some(wanted) {
                return false;
            }
        }

        true
    }
}
