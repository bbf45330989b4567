//! Loads `WidgetConfig` from `config.toml` plus environment overrides.
//!
//! Priority: environment (`NXCHAT_TENANT_ID`, `NXCHAT_API_URL`,
//! `NXCHAT_SOCKET_URL`) > `config.toml` > built-in timing defaults.

use crate::paths::NxChatPaths;
use nxchat_core::config::WidgetConfig;
use nxchat_core::error::{NxChatError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const ENV_TENANT_ID: &str = "NXCHAT_TENANT_ID";
pub const ENV_API_URL: &str = "NXCHAT_API_URL";
pub const ENV_SOCKET_URL: &str = "NXCHAT_SOCKET_URL";

/// On-disk shape; every field optional so env can fill the gaps.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    tenant_id: Option<String>,
    api_base_url: Option<String>,
    socket_url: Option<String>,
    watchdog_timeout: Option<u64>,
    ready_timeout: Option<u64>,
    reconnect_delay: Option<u64>,
    request_timeout: Option<u64>,
}

/// Loads the config from the default location and the process environment.
pub fn load_config(paths: &NxChatPaths) -> Result<WidgetConfig> {
    load_config_with(&paths.config_file()?, |key| std::env::var(key).ok())
}

/// Loads the config from `path`, resolving overrides through `env`.
///
/// # Errors
///
/// Returns `NxChatError::Config` if a required field is missing after
/// overrides or the result fails validation, and a serialization error if the
/// file is not valid TOML.
pub fn load_config_with<F>(path: &Path, env: F) -> Result<WidgetConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let file = if path.exists() {
        let content = fs::read_to_string(path)?;
        toml::from_str::<ConfigFile>(&content)?
    } else {
        tracing::debug!(
            "[ConfigLoader] {} not found, relying on environment",
            path.display()
        );
        ConfigFile::default()
    };

    let required = |env_key: &str, from_file: Option<String>, field: &str| {
        env(env_key).or(from_file).ok_or_else(|| {
            NxChatError::config(format!(
                "{field} is not set (add it to {} or set {env_key})",
                path.display()
            ))
        })
    };

    let tenant_id = required(ENV_TENANT_ID, file.tenant_id, "tenant_id")?;
    let api_base_url = required(ENV_API_URL, file.api_base_url, "api_base_url")?;
    let socket_url = required(ENV_SOCKET_URL, file.socket_url, "socket_url")?;

    let mut config = WidgetConfig::new(tenant_id, api_base_url, socket_url);
    if let Some(secs) = file.watchdog_timeout {
        config.watchdog_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file.ready_timeout {
        config.ready_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file.reconnect_delay {
        config.reconnect_delay = Duration::from_secs(secs);
    }
    if let Some(secs) = file.request_timeout {
        config.request_timeout = Duration::from_secs(secs);
    }

    config.validate()?;
    tracing::info!(
        "[ConfigLoader] Loaded config for tenant {} ({})",
        config.tenant_id,
        config.api_base_url
    );
    Ok(config)
}
