//! Integration tests for downloads from the manifest

mod common;

use bytes::Bytes;
use ::common::file_manager::{FileManagerError, UploadOptions};
use ::common::manifest::{ManifestTrie, TrieError};

async fn upload(env: &mut common::TestEnv, path: &str, data: &'static [u8]) {
    env.manager
        .upload_data(&env.stamp, Bytes::from_static(data), path, UploadOptions::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_download_file() {
    let mut env = common::setup_test_env();
    upload(&mut env, "dir/hello.txt", b"hello").await;

    let file = env
        .manager
        .download_file(env.manager.trie(), "./dir/hello.txt")
        .await
        .unwrap();
    assert_eq!(file.path, "dir/hello.txt");
    assert_eq!(file.data, Bytes::from_static(b"hello"));
    assert_eq!(file.metadata.filename.as_deref(), Some("hello.txt"));
}

#[tokio::test]
async fn test_download_unknown_path() {
    let mut env = common::setup_test_env();
    upload(&mut env, "dir/hello.txt", b"hello").await;

    let err = env
        .manager
        .download_file(env.manager.trie(), "dir/other.txt")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FileManagerError::Trie(TrieError::PathNotFound { .. })
    ));
}

#[tokio::test]
async fn test_download_missing_content() {
    let mut env = common::setup_test_env();
    upload(&mut env, "gone.txt", b"soon gone").await;

    let reference = env.manager.trie().resolve_path("gone.txt").unwrap().reference;
    env.content.remove(&reference).unwrap();

    let err = env
        .manager
        .download_file(env.manager.trie(), "gone.txt")
        .await
        .unwrap_err();
    assert!(matches!(err, FileManagerError::Download { .. }));
}

#[tokio::test]
async fn test_download_files_skips_failures() {
    let mut env = common::setup_test_env();
    upload(&mut env, "a.txt", b"aaa").await;
    upload(&mut env, "b/b.txt", b"bbb").await;
    upload(&mut env, "c.txt", b"ccc").await;

    let missing = env.manager.trie().resolve_path("b/b.txt").unwrap().reference;
    env.content.remove(&missing).unwrap();

    let files = env
        .manager
        .download_files(env.manager.trie())
        .await
        .unwrap()
        .unwrap();
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["a.txt", "c.txt"]);
    assert_eq!(files[1].data, Bytes::from_static(b"ccc"));
}

#[tokio::test]
async fn test_download_files_empty_trie() {
    let env = common::setup_test_env();
    let result = env.manager.download_files(&ManifestTrie::new()).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_download_files_all_failed() {
    let mut env = common::setup_test_env();
    upload(&mut env, "a.txt", b"aaa").await;

    let reference = env.manager.trie().resolve_path("a.txt").unwrap().reference;
    env.content.remove(&reference).unwrap();

    let files = env
        .manager
        .download_files(env.manager.trie())
        .await
        .unwrap()
        .unwrap();
    assert!(files.is_empty());
}
