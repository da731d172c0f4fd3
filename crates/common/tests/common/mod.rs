//! Shared test utilities for file manager integration tests
#![allow(dead_code)]

use std::path::PathBuf;

use common::crypto::SecretKey;
use common::feed::MemoryFeedProvider;
use common::file_manager::{FileManager, FileManagerConfig};
use common::store::{MemoryContentStore, PaymentStamp};
use tempfile::TempDir;

pub type TestManager = FileManager<MemoryContentStore, MemoryFeedProvider>;

pub struct TestEnv {
    pub manager: TestManager,
    pub content: MemoryContentStore,
    pub feeds: MemoryFeedProvider,
    pub key: SecretKey,
    pub stamp: PaymentStamp,
    pub dir: TempDir,
}

impl TestEnv {
    /// Another manager for the same owner over the same stores,
    ///  as a restarted process would build it
    pub fn reopen(&self) -> TestManager {
        FileManager::new(
            self.content.clone(),
            self.feeds.clone(),
            FileManagerConfig::new(self.key.clone()),
        )
        .unwrap()
    }

    /// Write a local file under the temp dir and return its path
    pub fn write_file(&self, relative: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }
}

/// Set up a file manager over in-memory stores with a fresh owner key
pub fn setup_test_env() -> TestEnv {
    let content = MemoryContentStore::new();
    let feeds = MemoryFeedProvider::new();
    let key = SecretKey::generate();

    let manager = FileManager::new(
        content.clone(),
        feeds.clone(),
        FileManagerConfig::new(key.clone()),
    )
    .unwrap();

    TestEnv {
        manager,
        content,
        feeds,
        key,
        stamp: PaymentStamp::new("test-stamp"),
        dir: TempDir::new().unwrap(),
    }
}
