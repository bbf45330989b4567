//! Identity store backed by `ClientStorage`.

use super::model::{VisitorIdentity, generate_session_id, generate_visitor_id};
use crate::storage::{ClientStorage, StorageScope, keys};
use std::sync::Arc;

/// Reads and creates visitor/session ids for a tenant.
///
/// Storage failures never surface: the store logs them and hands out an
/// ephemeral id that is only valid for the current load.
#[derive(Clone)]
pub struct IdentityStore {
    storage: Arc<dyn ClientStorage>,
}

impl IdentityStore {
    pub fn new(storage: Arc<dyn ClientStorage>) -> Self {
        Self { storage }
    }

    /// Returns the tenant's persisted visitor id, creating and persisting one if absent.
    pub async fn get_or_create_visitor_id(&self, tenant_id: &str) -> String {
        let key = keys::visitor_id(tenant_id);

        match self.storage.get(StorageScope::Durable, &key).await {
            Ok(Some(existing)) if !existing.is_empty() => return existing,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    "[IdentityStore] Durable storage unavailable, using ephemeral visitor id: {}",
                    e
                );
                return generate_visitor_id();
            }
        }

        let visitor_id = generate_visitor_id();
        if let Err(e) = self
            .storage
            .set(StorageScope::Durable, &key, &visitor_id)
            .await
        {
            tracing::warn!(
                "[IdentityStore] Failed to persist visitor id, it will not survive reload: {}",
                e
            );
        } else {
            tracing::info!("[IdentityStore] Created visitor id {}", visitor_id);
        }
        visitor_id
    }

    /// Generates a fresh session id for this load and records it in tab storage.
    pub async fn get_or_create_session_id(&self, tenant_id: &str) -> String {
        let session_id = generate_session_id();
        if let Err(e) = self
            .storage
            .set(StorageScope::Tab, &keys::session_id(tenant_id), &session_id)
            .await
        {
            tracing::warn!("[IdentityStore] Failed to record session id: {}", e);
        }
        session_id
    }

    /// Forgets the session id on unload. The visitor id is kept.
    pub async fn release_session(&self, tenant_id: &str) {
        if let Err(e) = self
            .storage
            .remove(StorageScope::Tab, &keys::session_id(tenant_id))
            .await
        {
            tracing::debug!("[IdentityStore] Failed to remove session id: {}", e);
        }
    }

    /// Resolves both ids for a new page load.
    pub async fn load(&self, tenant_id: &str) -> VisitorIdentity {
        VisitorIdentity {
            visitor_id: self.get_or_create_visitor_id(tenant_id).await,
            session_id: self.get_or_create_session_id(tenant_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NxChatError, Result};
    use std::collections::HashMap;
    use std::sync::Mutex;

    // Mock ClientStorage for testing
    #[derive(Default)]
    struct MockStorage {
        values: Mutex<HashMap<(StorageScope, String), String>>,
    }

    #[async_trait::async_trait]
    impl ClientStorage for MockStorage {
        async fn get(&self, scope: StorageScope, key: &str) -> Result<Option<String>> {
            let values = self.values.lock().unwrap();
            Ok(values.get(&(scope, key.to_string())).cloned())
        }

        async fn set(&self, scope: StorageScope, key: &str, value: &str) -> Result<()> {
            let mut values = self.values.lock().unwrap();
            values.insert((scope, key.to_string()), value.to_string());
            Ok(())
        }

        async fn remove(&self, scope: StorageScope, key: &str) -> Result<()> {
            let mut values = self.values.lock().unwrap();
            values.remove(&(scope, key.to_string()));
            Ok(())
        }
    }

    struct BrokenStorage;

    #[async_trait::async_trait]
    impl ClientStorage for BrokenStorage {
        async fn get(&self, _scope: StorageScope, _key: &str) -> Result<Option<String>> {
            Err(NxChatError::storage("disabled"))
        }

        async fn set(&self, _scope: StorageScope, _key: &str, _value: &str) -> Result<()> {
            Err(NxChatError::storage("disabled"))
        }

        async fn remove(&self, _scope: StorageScope, _key: &str) -> Result<()> {
            Err(NxChatError::storage("disabled"))
        }
    }

    /// One simulated page load followed by unload.
    async fn simulate_load(store: &IdentityStore, tenant: &str) -> VisitorIdentity {
        let identity = store.load(tenant).await;
        store.release_session(tenant).await;
        identity
    }

    #[tokio::test]
    async fn test_visitor_id_stable_across_loads() {
        let store = IdentityStore::new(Arc::new(MockStorage::default()));

        let first = simulate_load(&store, "acme").await;
        let second = simulate_load(&store, "acme").await;

        assert_eq!(first.visitor_id, second.visitor_id);
        assert_ne!(first.session_id, second.session_id);
    }

    #[tokio::test]
    async fn test_visitor_id_changes_when_storage_cleared() {
        let first =
            simulate_load(&IdentityStore::new(Arc::new(MockStorage::default())), "acme").await;
        let second =
            simulate_load(&IdentityStore::new(Arc::new(MockStorage::default())), "acme").await;

        assert_ne!(first.visitor_id, second.visitor_id);
    }

    #[tokio::test]
    async fn test_visitor_ids_are_tenant_scoped() {
        let store = IdentityStore::new(Arc::new(MockStorage::default()));

        let acme = store.get_or_create_visitor_id("acme").await;
        let globex = store.get_or_create_visitor_id("globex").await;

        assert_ne!(acme, globex);
        assert_eq!(acme, store.get_or_create_visitor_id("acme").await);
    }

    #[tokio::test]
    async fn test_session_id_removed_on_release() {
        let storage = Arc::new(MockStorage::default());
        let store = IdentityStore::new(storage.clone());

        let identity = store.load("acme").await;
        let key = keys::session_id("acme");
        assert_eq!(
            storage.get(StorageScope::Tab, &key).await.unwrap(),
            Some(identity.session_id)
        );

        store.release_session("acme").await;
        assert!(storage.get(StorageScope::Tab, &key).await.unwrap().is_none());
        assert!(
            storage
                .get(StorageScope::Durable, &keys::visitor_id("acme"))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_broken_storage_yields_ephemeral_ids() {
        let store = IdentityStore::new(Arc::new(BrokenStorage));

        let first = store.load("acme").await;
        let second = store.load("acme").await;

        assert!(first.visitor_id.starts_with("visitor_"));
        assert_ne!(first.visitor_id, second.visitor_id);
    }
}
