use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use super::path::{basename, extension};

/// MIME type used when the extension table has no entry
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub const CONTENT_TYPE_KEY: &str = "Content-Type";
pub const CONTENT_SIZE_KEY: &str = "Content-Size";
pub const TIME_UPLOADED_KEY: &str = "Time-Uploaded";
pub const FILENAME_KEY: &str = "Filename";
pub const CUSTOM_METADATA_KEY: &str = "Custom-Metadata";
pub const PINNED_KEY: &str = "pinned";

/// Caller supplied metadata fields, stored JSON-encoded
///  under `Custom-Metadata`
pub type CustomMetadata = BTreeMap<String, String>;

/// Metadata attached to every file fork in the manifest.
///
/// On the wire (and inside trie nodes) this is a JSON object using the
///  historical header-style keys, e.g.
///
/// ```json
/// {
///   "Content-Type": "text/plain",
///   "Content-Size": "1500",
///   "Time-Uploaded": "2024-05-01T12:00:00Z",
///   "Filename": "2.txt",
///   "Custom-Metadata": "{\"owner\":\"alice\"}"
/// }
/// ```
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    #[serde(rename = "Content-Type", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(rename = "Content-Size", skip_serializing_if = "Option::is_none")]
    pub content_size: Option<u64>,
    #[serde(rename = "Time-Uploaded", default, skip_serializing_if = "Option::is_none")]
    pub time_uploaded: Option<DateTime<Utc>>,
    /// Original basename of the file, not the full logical path
    #[serde(rename = "Filename", default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// JSON-encoded object of caller supplied fields
    #[serde(rename = "Custom-Metadata", default, skip_serializing_if = "Option::is_none")]
    pub custom_metadata: Option<String>,
    /// Set on forks created from the node's pinned set
    #[serde(rename = "pinned", default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
}

/// Inputs the caller may supply when metadata is built for a file
#[derive(Debug, Clone, Default)]
pub struct MetadataInput {
    /// Fields to store under `Custom-Metadata`
    pub custom: CustomMetadata,
    /// Explicit `Filename`; defaults to the basename of the logical path
    pub filename: Option<String>,
    /// Explicit `Content-Type`; defaults to a guess from the extension
    pub content_type: Option<String>,
}

impl FileMetadata {
    /// Build the metadata for a file about to be added at `logical_path`
    pub fn build(
        data: &[u8],
        logical_path: &str,
        input: &MetadataInput,
    ) -> Result<Self, serde_json::Error> {
        Self::build_at(data, logical_path, input, Utc::now())
    }

    /// Same as [`FileMetadata::build`] with an explicit upload time
    pub fn build_at(
        data: &[u8],
        logical_path: &str,
        input: &MetadataInput,
        now: DateTime<Utc>,
    ) -> Result<Self, serde_json::Error> {
        let filename = input
            .filename
            .clone()
            .unwrap_or_else(|| basename(logical_path).to_string());
        // the logical path decides; the filename only stands in for
        //  paths without an extension, like imports stored by reference
        let content_type = input.content_type.clone().unwrap_or_else(|| {
            match extension(logical_path) {
                Some(_) => guess_content_type(logical_path),
                None => guess_content_type(&filename),
            }
        });

        Ok(Self {
            content_type: Some(content_type),
            content_size: Some(data.len() as u64),
            time_uploaded: Some(now),
            filename: Some(filename),
            custom_metadata: Some(serde_json::to_string(&input.custom)?),
            pinned: None,
        })
    }

    /// Merge metadata for a path that is being re-added.
    ///
    /// Fields present in `incoming` win, custom fields are merged key by key
    ///  with `incoming` winning, and `Filename` is always recomputed from the
    ///  path so stale caller input can never drift it.
    pub fn merge_for_override(self, incoming: FileMetadata, logical_path: &str) -> Self {
        let custom_metadata = match (self.custom_fields(), incoming.custom_fields()) {
            (Some(mut existing), Some(incoming_fields)) => {
                existing.extend(incoming_fields);
                serde_json::to_string(&existing).ok()
            }
            _ => incoming.custom_metadata.or(self.custom_metadata),
        };

        Self {
            content_type: incoming.content_type.or(self.content_type),
            content_size: incoming.content_size.or(self.content_size),
            time_uploaded: incoming.time_uploaded.or(self.time_uploaded),
            filename: Some(basename(logical_path).to_string()),
            custom_metadata,
            pinned: incoming.pinned.or(self.pinned),
        }
    }

    /// Decode the `Custom-Metadata` object, if present and well formed
    pub fn custom_fields(&self) -> Option<BTreeMap<String, serde_json::Value>> {
        self.custom_metadata
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }

    /// String view of a metadata key.
    ///
    /// Recognized keys map onto the record fields; any other key is looked up
    ///  inside `Custom-Metadata`.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            CONTENT_TYPE_KEY => self.content_type.clone(),
            CONTENT_SIZE_KEY => self.content_size.map(|size| size.to_string()),
            TIME_UPLOADED_KEY => self
                .time_uploaded
                .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            FILENAME_KEY => self.filename.clone(),
            CUSTOM_METADATA_KEY => self.custom_metadata.clone(),
            PINNED_KEY => self.pinned.map(|pinned| pinned.to_string()),
            other => self
                .custom_fields()
                .and_then(|fields| fields.get(other).cloned())
                .map(|value| match value {
                    serde_json::Value::String(s) => s,
                    value => value.to_string(),
                }),
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned.unwrap_or(false)
    }
}

/// Guess a MIME type from a file name's extension
pub fn guess_content_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_build_metadata() {
        let input = MetadataInput {
            custom: CustomMetadata::from([("owner".to_string(), "alice".to_string())]),
            ..Default::default()
        };
        let metadata =
            FileMetadata::build_at(b"hello world", "docs/notes.txt", &input, fixed_time())
                .unwrap();

        assert_eq!(metadata.content_type.as_deref(), Some("text/plain"));
        assert_eq!(metadata.content_size, Some(11));
        assert_eq!(metadata.filename.as_deref(), Some("notes.txt"));
        assert_eq!(
            metadata.custom_metadata.as_deref(),
            Some(r#"{"owner":"alice"}"#)
        );
        assert_eq!(metadata.time_uploaded, Some(fixed_time()));
        assert_eq!(metadata.pinned, None);
    }

    #[test]
    fn test_build_defaults() {
        let metadata =
            FileMetadata::build(b"", "blob.unknownext", &MetadataInput::default()).unwrap();
        assert_eq!(metadata.content_type.as_deref(), Some(DEFAULT_CONTENT_TYPE));
        assert_eq!(metadata.custom_metadata.as_deref(), Some("{}"));
        assert_eq!(metadata.content_size, Some(0));
    }

    #[test]
    fn test_explicit_filename_override() {
        let input = MetadataInput {
            filename: Some("original.png".to_string()),
            ..Default::default()
        };
        let metadata = FileMetadata::build(b"x", "uploads/abc123", &input).unwrap();
        assert_eq!(metadata.filename.as_deref(), Some("original.png"));
        assert_eq!(metadata.content_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_content_type_follows_logical_path() {
        let input = MetadataInput {
            filename: Some("scan.png".to_string()),
            ..Default::default()
        };
        let metadata = FileMetadata::build(b"x", "docs/scan.pdf", &input).unwrap();
        assert_eq!(metadata.filename.as_deref(), Some("scan.png"));
        assert_eq!(metadata.content_type.as_deref(), Some("application/pdf"));
    }

    #[test]
    fn test_wire_format_keys() {
        let metadata = FileMetadata::build_at(
            &[0u8; 1500],
            "file/2.txt",
            &MetadataInput::default(),
            fixed_time(),
        )
        .unwrap();
        let json: serde_json::Value = serde_json::to_value(&metadata).unwrap();

        assert_eq!(json["Content-Type"], "text/plain");
        assert_eq!(json["Content-Size"], "1500");
        assert_eq!(json["Time-Uploaded"], "2024-05-01T12:00:00Z");
        assert_eq!(json["Filename"], "2.txt");
        assert_eq!(json["Custom-Metadata"], "{}");
        assert!(json.get("pinned").is_none());

        let decoded: FileMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, metadata);
    }

    #[test]
    fn test_merge_incoming_wins_but_filename_follows_path() {
        let existing = FileMetadata {
            content_type: Some("text/plain".to_string()),
            content_size: Some(10),
            filename: Some("old.txt".to_string()),
            custom_metadata: Some(r#"{"a":"1","b":"2"}"#.to_string()),
            pinned: Some(true),
            ..Default::default()
        };
        let incoming = FileMetadata {
            content_size: Some(20),
            filename: Some("stale-caller-value.txt".to_string()),
            custom_metadata: Some(r#"{"b":"3"}"#.to_string()),
            ..Default::default()
        };

        let merged = existing.merge_for_override(incoming, "dir/new.txt");

        assert_eq!(merged.content_type.as_deref(), Some("text/plain"));
        assert_eq!(merged.content_size, Some(20));
        assert_eq!(merged.filename.as_deref(), Some("new.txt"));
        assert_eq!(merged.pinned, Some(true));
        assert_eq!(merged.get("a").as_deref(), Some("1"));
        assert_eq!(merged.get("b").as_deref(), Some("3"));
    }

    #[test]
    fn test_get_reads_record_and_custom_fields() {
        let metadata = FileMetadata {
            content_size: Some(42),
            custom_metadata: Some(r#"{"tag":"x","count":3}"#.to_string()),
            pinned: Some(false),
            ..Default::default()
        };
        assert_eq!(metadata.get(CONTENT_SIZE_KEY).as_deref(), Some("42"));
        assert_eq!(metadata.get(PINNED_KEY).as_deref(), Some("false"));
        assert_eq!(metadata.get("tag").as_deref(), Some("x"));
        assert_eq!(metadata.get("count").as_deref(), Some("3"));
        assert_eq!(metadata.get("missing"), None);
        assert_eq!(metadata.get(CONTENT_TYPE_KEY), None);
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("data.json"), "application/json");
        assert_eq!(guess_content_type("image.png"), "image/png");
        assert_eq!(guess_content_type("README"), DEFAULT_CONTENT_TYPE);
    }
}
