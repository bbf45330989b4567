//! File-backed `ClientStorage`.

use super::atomic_json::{AtomicJsonError, AtomicJsonFile};
use crate::paths::NxChatPaths;
use async_trait::async_trait;
use nxchat_core::error::{NxChatError, Result};
use nxchat_core::storage::{ClientStorage, StorageScope};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

type Document = BTreeMap<String, String>;

/// Durable values in one JSON document on disk, tab values in memory.
///
/// The tab scope lives exactly as long as this value, which matches one run of
/// a headless widget.
#[derive(Clone)]
pub struct FileClientStorage {
    file: Arc<AtomicJsonFile<Document>>,
    tab: Arc<RwLock<HashMap<String, String>>>,
}

impl FileClientStorage {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicJsonFile::new(path)),
            tab: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Storage at the default location (`<data dir>/storage.json`).
    pub fn from_paths(paths: &NxChatPaths) -> Result<Self> {
        Ok(Self::new(paths.storage_file()?))
    }

    /// Runs a closure against the durable document on the blocking pool.
    async fn with_document<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&AtomicJsonFile<Document>) -> std::result::Result<R, AtomicJsonError>
            + Send
            + 'static,
        R: Send + 'static,
    {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || f(file.as_ref()))
            .await
            .map_err(|e| NxChatError::internal(format!("Failed to join task: {}", e)))?
            .map_err(NxChatError::from)
    }
}

#[async_trait]
impl ClientStorage for FileClientStorage {
    async fn get(&self, scope: StorageScope, key: &str) -> Result<Option<String>> {
        match scope {
            StorageScope::Tab => Ok(self.tab.read().await.get(key).cloned()),
            StorageScope::Durable => {
                let key = key.to_string();
                self.with_document(move |file| {
                    Ok(file.load()?.and_then(|mut doc| doc.remove(&key)))
                })
                .await
            }
        }
    }

    async fn set(&self, scope: StorageScope, key: &str, value: &str) -> Result<()> {
        match scope {
            StorageScope::Tab => {
                self.tab.write().await.insert(key.to_string(), value.to_string());
                Ok(())
            }
            StorageScope::Durable => {
                let key = key.to_string();
                let value = value.to_string();
                self.with_document(move |file| {
                    let (k, v) = (key.clone(), value.clone());
                    match file.update(Document::new(), move |doc| {
                        doc.insert(k, v);
                    }) {
                        Err(AtomicJsonError::Json(e)) => {
                            tracing::warn!(
                                "[FileClientStorage] {} is unreadable ({}), starting a new document",
                                file.path().display(),
                                e
                            );
                            let mut doc = Document::new();
                            doc.insert(key, value);
                            file.save(&doc)
                        }
                        other => other,
                    }
                })
                .await
            }
        }
    }

    async fn remove(&self, scope: StorageScope, key: &str) -> Result<()> {
        match scope {
            StorageScope::Tab => {
                self.tab.write().await.remove(key);
                Ok(())
            }
            StorageScope::Durable => {
                let key = key.to_string();
                self.with_document(move |file| {
                    if file.load()?.is_none() {
                        return Ok(());
                    }
                    file.update(Document::new(), |doc| {
                        doc.remove(&key);
                    })
                })
                .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_durable_values_survive_new_instance() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");

        let first = FileClientStorage::new(path.clone());
        first.set(StorageScope::Durable, "visitor", "visitor_a_1").await.unwrap();
        first.set(StorageScope::Tab, "session", "session_1_a").await.unwrap();

        // a new instance is a new tab over the same disk
        let second = FileClientStorage::new(path);
        assert_eq!(
            second.get(StorageScope::Durable, "visitor").await.unwrap().as_deref(),
            Some("visitor_a_1")
        );
        assert!(second.get(StorageScope::Tab, "session").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_durable_key() {
        let dir = TempDir::new().unwrap();
        let storage = FileClientStorage::new(dir.path().join("storage.json"));

        storage.remove(StorageScope::Durable, "absent").await.unwrap();
        storage.set(StorageScope::Durable, "k", "v").await.unwrap();
        storage.remove(StorageScope::Durable, "k").await.unwrap();

        assert!(storage.get(StorageScope::Durable, "k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_replaced_on_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();
        let storage = FileClientStorage::new(path);

        assert!(storage.get(StorageScope::Durable, "k").await.is_err());

        storage.set(StorageScope::Durable, "k", "v").await.unwrap();
        assert_eq!(
            storage.get(StorageScope::Durable, "k").await.unwrap().as_deref(),
            Some("v")
        );
    }
}
