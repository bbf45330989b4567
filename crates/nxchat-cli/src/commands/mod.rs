pub mod chat;
pub mod history;
pub mod identity;

use anyhow::{Context, Result};
use nxchat_core::config::WidgetConfig;
use nxchat_infrastructure::{FileClientStorage, NxChatPaths, load_config};
use std::sync::Arc;

/// Config plus the file-backed storage every command works against.
pub(crate) fn open(paths: &NxChatPaths) -> Result<(WidgetConfig, Arc<FileClientStorage>)> {
    let config = load_config(paths).context("Failed to load NxChat config")?;
    let storage = FileClientStorage::from_paths(paths).context("Failed to open client storage")?;
    Ok((config, Arc::new(storage)))
}
