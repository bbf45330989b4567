//! Widget configuration.
//!
//! `WidgetConfig` is the primary contract: embedders construct it explicitly
//! (or load it through `nxchat_infrastructure::config_loader`). `EmbedContext`
//! keeps the script-tag auto-detection around as a fallback for pages that only
//! drop the widget script in.

use crate::error::{NxChatError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// File name the widget script is served under. Used for origin auto-detection.
pub const WIDGET_SCRIPT_NAME: &str = "nxchat-widget.js";

const DEFAULT_WATCHDOG_SECS: u64 = 120;
const DEFAULT_READY_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RECONNECT_DELAY_SECS: u64 = 2;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Runtime configuration of one widget instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Tenant (company) the widget belongs to. Scopes every storage key.
    pub tenant_id: String,
    /// Base URL of the REST API, e.g. `https://chat.example.com/api`
    pub api_base_url: String,
    /// Base URL of the Socket.io server, e.g. `https://chat.example.com`
    pub socket_url: String,
    /// How long a visitor waits for a human agent before the "still waiting" notice
    #[serde(default = "default_watchdog_timeout", with = "duration_secs")]
    pub watchdog_timeout: Duration,
    /// Upper bound on waiting for socket + identity before dispatching the load flow
    #[serde(default = "default_ready_timeout", with = "duration_secs")]
    pub ready_timeout: Duration,
    /// Delay between socket reconnect attempts
    #[serde(default = "default_reconnect_delay", with = "duration_secs")]
    pub reconnect_delay: Duration,
    /// Per-request timeout for REST calls
    #[serde(default = "default_request_timeout", with = "duration_secs")]
    pub request_timeout: Duration,
}

fn default_watchdog_timeout() -> Duration {
    Duration::from_secs(DEFAULT_WATCHDOG_SECS)
}

fn default_ready_timeout() -> Duration {
    Duration::from_secs(DEFAULT_READY_TIMEOUT_SECS)
}

fn default_reconnect_delay() -> Duration {
    Duration::from_secs(DEFAULT_RECONNECT_DELAY_SECS)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
}

impl WidgetConfig {
    /// Creates a config with default timings.
    pub fn new(
        tenant_id: impl Into<String>,
        api_base_url: impl Into<String>,
        socket_url: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            api_base_url: api_base_url.into(),
            socket_url: socket_url.into(),
            watchdog_timeout: default_watchdog_timeout(),
            ready_timeout: default_ready_timeout(),
            reconnect_delay: default_reconnect_delay(),
            request_timeout: default_request_timeout(),
        }
    }

    /// Overrides the agent-response watchdog duration.
    pub fn with_watchdog_timeout(mut self, timeout: Duration) -> Self {
        self.watchdog_timeout = timeout;
        self
    }

    /// Overrides the readiness cap.
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// Checks that the tenant is set and both URLs parse as http(s).
    ///
    /// # Errors
    ///
    /// Returns `NxChatError::Config` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.tenant_id.trim().is_empty() {
            return Err(NxChatError::config("tenant_id must not be empty"));
        }
        parse_http_url("api_base_url", &self.api_base_url)?;
        parse_http_url("socket_url", &self.socket_url)?;
        Ok(())
    }
}

fn parse_http_url(field: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value)
        .map_err(|e| NxChatError::config(format!("{field} '{value}' is not a valid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(NxChatError::config(format!(
            "{field} must use http or https, got '{other}'"
        ))),
    }
}

/// What a page exposes about the embedded widget.
///
/// Mirrors the embed surface: a `data-tenant-id` attribute on the widget's
/// script tag, an optional page-global tenant override, and the `src` of every
/// script on the page.
#[derive(Debug, Clone, Default)]
pub struct EmbedContext {
    pub data_tenant_id: Option<String>,
    pub global_tenant_id: Option<String>,
    pub script_sources: Vec<String>,
}

impl EmbedContext {
    /// Derives a `WidgetConfig` from the embed surface.
    ///
    /// The tenant comes from `data-tenant-id`, falling back to the global
    /// override. The origin of the first script whose path ends in
    /// [`WIDGET_SCRIPT_NAME`] becomes the socket URL, and `<origin>/api` the
    /// REST base.
    ///
    /// # Errors
    ///
    /// Returns `NxChatError::Config` when no tenant id or no widget script is found.
    pub fn detect(&self) -> Result<WidgetConfig> {
        let non_blank = |t: &&str| !t.trim().is_empty();
        let tenant_id = self
            .data_tenant_id
            .as_deref()
            .filter(non_blank)
            .or(self.global_tenant_id.as_deref().filter(non_blank))
            .ok_or_else(|| NxChatError::config("no tenant id found on the embed"))?;

        let origin = self
            .script_sources
            .iter()
            .filter_map(|src| Url::parse(src).ok())
            .find(|url| url.path().ends_with(WIDGET_SCRIPT_NAME))
            .map(|url| url.origin().ascii_serialization())
            .ok_or_else(|| {
                NxChatError::config(format!("no <script> loading {WIDGET_SCRIPT_NAME} found"))
            })?;

        Ok(WidgetConfig::new(
            tenant_id,
            format!("{origin}/api"),
            origin,
        ))
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WidgetConfig::new("acme", "https://chat.acme.io/api", "https://chat.acme.io");
        assert_eq!(config.watchdog_timeout, Duration::from_secs(120));
        assert_eq!(config.ready_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = WidgetConfig::new("  ", "https://a.io/api", "https://a.io");
        assert!(config.validate().unwrap_err().is_config());

        let config = WidgetConfig::new("acme", "ftp://a.io/api", "https://a.io");
        assert!(config.validate().is_err());

        let config = WidgetConfig::new("acme", "https://a.io/api", "not a url");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_detect_from_script_tags() {
        let ctx = EmbedContext {
            data_tenant_id: Some("acme".into()),
            global_tenant_id: Some("ignored".into()),
            script_sources: vec![
                "https://cdn.other.io/analytics.js".into(),
                "https://chat.acme.io:8443/static/nxchat-widget.js?v=3".into(),
            ],
        };
        let config = ctx.detect().unwrap();
        assert_eq!(config.tenant_id, "acme");
        assert_eq!(config.socket_url, "https://chat.acme.io:8443");
        assert_eq!(config.api_base_url, "https://chat.acme.io:8443/api");
    }

    #[test]
    fn test_detect_falls_back_to_global_tenant() {
        let ctx = EmbedContext {
            data_tenant_id: None,
            global_tenant_id: Some("globex".into()),
            script_sources: vec!["http://localhost:5000/nxchat-widget.js".into()],
        };
        assert_eq!(ctx.detect().unwrap().tenant_id, "globex");
    }

    #[test]
    fn test_detect_skips_blank_data_attribute() {
        let ctx = EmbedContext {
            data_tenant_id: Some("  ".into()),
            global_tenant_id: Some("globex".into()),
            script_sources: vec!["http://localhost:5000/nxchat-widget.js".into()],
        };
        assert_eq!(ctx.detect().unwrap().tenant_id, "globex");

        let ctx = EmbedContext {
            data_tenant_id: Some(String::new()),
            global_tenant_id: Some(String::new()),
            ..ctx
        };
        assert!(ctx.detect().unwrap_err().is_config());
    }

    #[test]
    fn test_detect_without_script_fails() {
        let ctx = EmbedContext {
            data_tenant_id: Some("acme".into()),
            ..Default::default()
        };
        assert!(ctx.detect().is_err());
    }

    #[test]
    fn test_toml_roundtrip_uses_seconds() {
        let parsed: WidgetConfig = toml::from_str(
            r#"
            tenant_id = "acme"
            api_base_url = "https://a.io/api"
            socket_url = "https://a.io"
            watchdog_timeout = 5
            "#,
        )
        .unwrap();
        assert_eq!(parsed.watchdog_timeout, Duration::from_secs(5));
        assert_eq!(parsed.ready_timeout, Duration::from_secs(30));
    }
}
