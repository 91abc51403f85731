//! Configuration loading and resolution.

use std::time::Duration;

use crate::types::{Implementation, MCP_VERSION};

/// Environment variable consulted when no timeout is given explicitly.
pub const TIMEOUT_ENV_VAR: &str = "LOOPBACK_MCP_TIMEOUT_MS";

/// Request timeout used by the command line when nothing else is set.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Resolve the per-request timeout: explicit value, then the environment,
/// then the default. Zero means wait forever.
pub fn resolve_request_timeout(explicit: Option<u64>) -> Option<Duration> {
    let millis = explicit
        .or_else(|| timeout_from_env(std::env::var(TIMEOUT_ENV_VAR).ok()))
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);

    (millis > 0).then(|| Duration::from_millis(millis))
}

fn timeout_from_env(raw: Option<String>) -> Option<u64> {
    let raw = raw?;
    match raw.trim().parse::<u64>() {
        Ok(millis) => Some(millis),
        Err(e) => {
            tracing::warn!("Ignoring {TIMEOUT_ENV_VAR}={raw:?}: {e}");
            None
        }
    }
}

/// Client-side session settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Protocol version offered in the initialize handshake.
    pub protocol_version: String,
    pub client_info: Implementation,
    /// `None` waits for every response indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            protocol_version: MCP_VERSION.to_string(),
            client_info: Implementation::client(),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_timeout_wins() {
        assert_eq!(
            resolve_request_timeout(Some(250)),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_zero_disables_timeout() {
        assert_eq!(resolve_request_timeout(Some(0)), None);
    }

    #[test]
    fn test_env_value_parsing() {
        assert_eq!(timeout_from_env(Some(" 1500 ".to_string())), Some(1500));
        assert_eq!(timeout_from_env(Some("soon".to_string())), None);
        assert_eq!(timeout_from_env(None), None);
    }

    #[test]
    fn test_default_config_has_no_timeout() {
        let config = ClientConfig::default();
        assert_eq!(config.protocol_version, MCP_VERSION);
        assert_eq!(config.client_info.name, "loopback-mcp-client");
        assert!(config.request_timeout.is_none());

        let config = config.with_request_timeout(Some(Duration::from_secs(1)));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(1)));
    }
}
