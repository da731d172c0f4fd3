//! Integration tests for listing and searching the manifest

mod common;

use bytes::Bytes;
use ::common::file_manager::{SearchCriteria, UploadOptions};
use ::common::manifest::CustomMetadata;

async fn populated() -> common::TestEnv {
    let mut env = common::setup_test_env();
    let no_save = UploadOptions {
        auto_save: false,
        ..Default::default()
    };
    env.manager
        .upload_data(&env.stamp, Bytes::from(vec![1u8; 500]), "file/1.txt", no_save.clone())
        .await
        .unwrap();
    let tagged = UploadOptions {
        custom_metadata: CustomMetadata::from([("tag".to_string(), "big".to_string())]),
        ..no_save
    };
    env.manager
        .upload_data(&env.stamp, Bytes::from(vec![2u8; 1500]), "file/2.txt", tagged)
        .await
        .unwrap();
    env
}

fn paths(entries: Vec<::common::manifest::FileEntry>) -> Vec<String> {
    let mut paths: Vec<String> = entries.into_iter().map(|e| e.path).collect();
    paths.sort();
    paths
}

#[tokio::test]
async fn test_list_files() {
    let env = populated().await;
    let trie = env.manager.trie();

    let bare = env.manager.list_files(trie, false).unwrap();
    assert!(bare.iter().all(|e| e.metadata.is_none()));
    assert_eq!(paths(bare), vec!["file/1.txt", "file/2.txt"]);

    let full = env.manager.list_files(trie, true).unwrap();
    assert!(full.iter().all(|e| e.metadata.is_some()));
}

#[tokio::test]
async fn test_search_by_name() {
    let env = populated().await;
    let trie = env.manager.trie();

    let found = env.manager.search_files_by_name(trie, "2.txt", false).unwrap();
    assert_eq!(paths(found), vec!["file/2.txt"]);

    let found = env.manager.search_files_by_name(trie, ".txt", false).unwrap();
    assert_eq!(found.len(), 2);
}

#[tokio::test]
async fn test_search_by_size() {
    let env = populated().await;
    let criteria = SearchCriteria {
        min_size: Some(1000),
        max_size: Some(2000),
        ..Default::default()
    };

    let found = env
        .manager
        .search_files(env.manager.trie(), &criteria, true)
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].path, "file/2.txt");
    assert_eq!(found[0].metadata.as_ref().unwrap().content_size, Some(1500));
}

#[tokio::test]
async fn test_search_combined_criteria() {
    let env = populated().await;
    let trie = env.manager.trie();

    let criteria = SearchCriteria {
        directory: Some("file".to_string()),
        extension: Some("txt".to_string()),
        metadata: [("tag".to_string(), "big".to_string())].into(),
        ..Default::default()
    };
    assert_eq!(
        paths(env.manager.search_files(trie, &criteria, false).unwrap()),
        vec!["file/2.txt"]
    );

    let criteria = SearchCriteria {
        file_name: Some("1.txt".to_string()),
        min_size: Some(1000),
        ..Default::default()
    };
    assert!(env.manager.search_files(trie, &criteria, false).unwrap().is_empty());
}
