//! Logical path handling for manifest keys.
//!
//! Logical paths are always `/`-separated UTF-8 strings, regardless of the
//! host platform. They are encoded to raw UTF-8 bytes to form trie keys; the
//! encoding carries no salt, so keys are stable across runs.

pub const PATH_SEPARATOR: char = '/';
pub const PATH_SEPARATOR_BYTE: u8 = b'/';

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path bytes are not valid utf-8 (valid up to byte {valid_up_to}): {source}")]
    Encoding {
        valid_up_to: usize,
        #[source]
        source: std::str::Utf8Error,
    },
}

/// Encode a logical path into trie key bytes
pub fn encode_path(path: &str) -> Vec<u8> {
    path.as_bytes().to_vec()
}

/// Decode trie key bytes back into a logical path
///
/// Fails only on byte sequences that never came out of [`encode_path`].
pub fn decode_path(bytes: &[u8]) -> Result<String, PathError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|source| PathError::Encoding {
            valid_up_to: source.valid_up_to(),
            source,
        })
}

/// Normalize a logical path: leading `./` and `/` and any trailing `/`
///  are dropped, so `./a/b`, `/a/b` and `a/b/` address the same file.
pub fn normalize_path(path: &str) -> String {
    let mut path = path;
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest;
        } else if let Some(rest) = path.strip_prefix(PATH_SEPARATOR) {
            path = rest;
        } else {
            break;
        }
    }
    let path = path.trim_end_matches(PATH_SEPARATOR);
    if path == "." {
        String::new()
    } else {
        path.to_string()
    }
}

/// Last component of a logical path
pub fn basename(path: &str) -> &str {
    path.trim_end_matches(PATH_SEPARATOR)
        .rsplit(PATH_SEPARATOR)
        .next()
        .unwrap_or("")
}

/// Everything before the last component, without the trailing separator.
///  Empty for top-level files.
pub fn dirname(path: &str) -> &str {
    let path = path.trim_end_matches(PATH_SEPARATOR);
    match path.rfind(PATH_SEPARATOR) {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Extension of the last component, without the dot.
///  Dotfiles such as `.env` have no extension.
pub fn extension(path: &str) -> Option<&str> {
    let name = basename(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(&name[idx + 1..]),
    }
}

/// Split a logical path into its non-empty components
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(PATH_SEPARATOR).filter(|s| !s.is_empty())
}
