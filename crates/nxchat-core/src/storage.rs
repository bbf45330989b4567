//! Client-side key/value storage contract.
//!
//! The widget persists a handful of tenant-scoped strings. Two lifetimes exist:
//! `Durable` survives reloads (visitor id, chat history) and `Tab` lives as long
//! as the hosting tab or process (session id, landing page).

use crate::error::Result;
use async_trait::async_trait;

/// Lifetime of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageScope {
    /// Survives reloads until explicitly cleared.
    Durable,
    /// Dropped when the hosting tab/process goes away.
    Tab,
}

/// An abstract key/value store for widget state.
///
/// Implementations decide where values live; the widget only relies on
/// read-your-writes within one scope.
#[async_trait]
pub trait ClientStorage: Send + Sync {
    /// Reads a value.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: Key present
    /// - `Ok(None)`: Key absent
    /// - `Err(_)`: Storage unavailable
    async fn get(&self, scope: StorageScope, key: &str) -> Result<Option<String>>;

    /// Writes a value, replacing any previous one.
    async fn set(&self, scope: StorageScope, key: &str, value: &str) -> Result<()>;

    /// Removes a value. Removing an absent key is not an error.
    async fn remove(&self, scope: StorageScope, key: &str) -> Result<()>;
}

/// Tenant-scoped storage keys.
pub mod keys {
    pub fn visitor_id(tenant_id: &str) -> String {
        format!("nxchat_visitor_id_{tenant_id}")
    }

    pub fn session_id(tenant_id: &str) -> String {
        format!("nxchat_session_id_{tenant_id}")
    }

    pub fn history(tenant_id: &str) -> String {
        format!("nxchat_history_{tenant_id}")
    }

    pub fn landing_page(tenant_id: &str) -> String {
        format!("nxchat_landing_page_{tenant_id}")
    }
}
