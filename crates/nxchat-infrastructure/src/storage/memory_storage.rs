//! In-memory `ClientStorage`.

use async_trait::async_trait;
use nxchat_core::error::Result;
use nxchat_core::storage::{ClientStorage, StorageScope};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Keeps both scopes in memory. Used by tests and by embeds that must not
/// touch the disk.
#[derive(Debug, Default)]
pub struct InMemoryClientStorage {
    values: RwLock<HashMap<(StorageScope, String), String>>,
}

impl InMemoryClientStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every value of one scope. `Tab` simulates closing the tab,
    /// `Durable` simulates the visitor clearing site data.
    pub async fn clear_scope(&self, scope: StorageScope) {
        self.values.write().await.retain(|(s, _), _| *s != scope);
    }

    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }
}

#[async_trait]
impl ClientStorage for InMemoryClientStorage {
    async fn get(&self, scope: StorageScope, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(&(scope, key.to_string())).cloned())
    }

    async fn set(&self, scope: StorageScope, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert((scope, key.to_string()), value.to_string());
        Ok(())
    }

    async fn remove(&self, scope: StorageScope, key: &str) -> Result<()> {
        self.values.write().await.remove(&(scope, key.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scopes_are_independent() {
        let storage = InMemoryClientStorage::new();
        storage.set(StorageScope::Durable, "k", "durable").await.unwrap();
        storage.set(StorageScope::Tab, "k", "tab").await.unwrap();

        storage.clear_scope(StorageScope::Tab).await;

        assert_eq!(
            storage.get(StorageScope::Durable, "k").await.unwrap().as_deref(),
            Some("durable")
        );
        assert!(storage.get(StorageScope::Tab, "k").await.unwrap().is_none());
        assert_eq!(storage.len().await, 1);
    }
}
