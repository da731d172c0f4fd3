mod metadata;
mod node;
mod path;
mod trie;

pub use metadata::{
    guess_content_type, CustomMetadata, FileMetadata, MetadataInput, CONTENT_SIZE_KEY,
    CONTENT_TYPE_KEY, CUSTOM_METADATA_KEY, DEFAULT_CONTENT_TYPE, FILENAME_KEY, PINNED_KEY,
    TIME_UPLOADED_KEY,
};
pub use node::{Fork, ForkRecord, Node, NodeCodecError, NodeRecord};
pub use path::{
    basename, decode_path, dirname, encode_path, extension, normalize_path, segments, PathError,
    PATH_SEPARATOR,
};
pub use trie::{
    FileEntry, ManifestEntry, ManifestTrie, NodeStore, ResolvedFile, TrieError, MAX_LOAD_DEPTH,
};
