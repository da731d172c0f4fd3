//! Integration tests for uploads into the manifest

mod common;

use bytes::Bytes;
use ::common::file_manager::{FileManagerError, UploadOptions};
use ::common::manifest::{CustomMetadata, ManifestTrie};
use ::common::store::{ContentStore, ContentStoreError, PaymentStamp};

fn to(destination: &str) -> UploadOptions {
    UploadOptions {
        destination: Some(destination.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_upload_file_records_metadata() {
    let mut env = common::setup_test_env();
    let local = env.write_file("local/report.txt", b"quarterly numbers");

    let options = UploadOptions {
        custom_metadata: CustomMetadata::from([("owner".to_string(), "alice".to_string())]),
        ..to("docs/report.txt")
    };
    let reference = env
        .manager
        .upload_file(&env.stamp, &local, options)
        .await
        .unwrap();

    let resolved = env.manager.trie().resolve_path("docs/report.txt").unwrap();
    assert_eq!(resolved.reference, reference);
    assert_eq!(resolved.metadata.content_size, Some(17));
    assert_eq!(resolved.metadata.content_type.as_deref(), Some("text/plain"));
    assert_eq!(resolved.metadata.filename.as_deref(), Some("report.txt"));
    assert_eq!(resolved.metadata.get("owner").as_deref(), Some("alice"));
    assert!(resolved.metadata.time_uploaded.is_some());

    // uploads are pinned by the store
    let pinned = env.content.list_pinned().await.unwrap();
    assert!(pinned.contains(&reference));
}

#[tokio::test]
async fn test_auto_save_moves_the_feed() {
    let mut env = common::setup_test_env();

    env.manager
        .upload_data(&env.stamp, Bytes::from_static(b"one"), "a.txt", UploadOptions::default())
        .await
        .unwrap();
    let first = env.manager.feed().read_own_pointer().await.unwrap().unwrap();
    assert_eq!(first.index, 0);
    assert_eq!(Some(&first.reference), env.manager.trie().root_reference());

    env.manager
        .upload_data(&env.stamp, Bytes::from_static(b"two"), "b.txt", UploadOptions::default())
        .await
        .unwrap();
    let second = env.manager.feed().read_own_pointer().await.unwrap().unwrap();
    assert_eq!(second.index, 1);
    assert_ne!(second.reference, first.reference);
}

#[tokio::test]
async fn test_no_auto_save_leaves_feed_untouched() {
    let mut env = common::setup_test_env();

    let options = UploadOptions {
        auto_save: false,
        ..Default::default()
    };
    env.manager
        .upload_data(&env.stamp, Bytes::from_static(b"data"), "a.txt", options)
        .await
        .unwrap();

    assert!(env.manager.trie().resolve_path("a.txt").is_ok());
    assert!(env.manager.trie().is_dirty());
    assert!(env.manager.feed().read_own_pointer().await.unwrap().is_none());
}

#[tokio::test]
async fn test_upload_file_to_separate_trie() {
    let mut env = common::setup_test_env();
    let local = env.write_file("x.bin", &[7u8; 64]);

    let mut other = ManifestTrie::new();
    let reference = env
        .manager
        .upload_file_to(&mut other, &env.stamp, &local, to("elsewhere/x.bin"))
        .await
        .unwrap();

    assert_eq!(other.resolve_path("elsewhere/x.bin").unwrap().reference, reference);
    assert!(env.manager.trie().is_empty());
    assert!(env.manager.feed().read_own_pointer().await.unwrap().is_none());

    // the instance trie is still usable afterwards
    env.manager
        .upload_file(&env.stamp, &local, to("x.bin"))
        .await
        .unwrap();
    assert_eq!(env.manager.trie().len(), 1);
}

#[tokio::test]
async fn test_rejected_upload_adds_no_fork() {
    let mut env = common::setup_test_env();

    let err = env
        .manager
        .upload_data(
            &PaymentStamp::new(""),
            Bytes::from_static(b"data"),
            "a.txt",
            UploadOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FileManagerError::Upload {
            source: ContentStoreError::InvalidStamp(_),
            ..
        }
    ));
    assert!(env.manager.trie().is_empty());
}

#[tokio::test]
async fn test_upload_missing_local_file() {
    let mut env = common::setup_test_env();
    let missing = env.dir.path().join("missing.txt");

    let err = env
        .manager
        .upload_file(&env.stamp, &missing, UploadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FileManagerError::ReadFile { .. }));
}

#[tokio::test]
async fn test_override_keeps_path_and_replaces_content() {
    let mut env = common::setup_test_env();

    let first = env
        .manager
        .upload_data(&env.stamp, Bytes::from_static(b"v1"), "notes.md", UploadOptions::default())
        .await
        .unwrap();
    let second = env
        .manager
        .upload_data(&env.stamp, Bytes::from_static(b"version two"), "notes.md", UploadOptions::default())
        .await
        .unwrap();

    assert_ne!(first, second);
    let resolved = env.manager.trie().resolve_path("notes.md").unwrap();
    assert_eq!(resolved.reference, second);
    assert_eq!(resolved.metadata.content_size, Some(11));
    assert_eq!(env.manager.trie().len(), 1);
}
