//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files and
//! every field has a default, so an empty file is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http::WireOptions;

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Session cookie and lifetime.
    pub session: SessionConfig,

    /// Per-socket timeouts.
    pub timeouts: TimeoutConfig,

    /// Response serialization switches.
    pub response: ResponseConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie carrying the session id.
    pub cookie_name: String,

    /// Absolute session lifetime in seconds, counted from creation.
    pub ttl_secs: u64,

    /// How often the reaper scans for expired sessions, in milliseconds.
    pub reap_interval_ms: u64,
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_millis(self.reap_interval_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "MuSID".to_string(),
            ttl_secs: 30 * 60,
            reap_interval_ms: 1000,
        }
    }
}

/// Timeout configuration for accepted sockets.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Blocking read timeout in seconds (0 = wait forever).
    pub read_secs: u64,

    /// Blocking write timeout in seconds (0 = wait forever).
    pub write_secs: u64,
}

impl TimeoutConfig {
    pub fn read(&self) -> Option<Duration> {
        (self.read_secs > 0).then(|| Duration::from_secs(self.read_secs))
    }

    pub fn write(&self) -> Option<Duration> {
        (self.write_secs > 0).then(|| Duration::from_secs(self.write_secs))
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 30,
            write_secs: 30,
        }
    }
}

/// Response serialization configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Value of the `HTTPServer` response header.
    pub server_name: String,

    /// Emit the `Content-Lenth` spelling expected by older clients.
    pub legacy_content_length_header: bool,
}

impl ResponseConfig {
    pub fn wire_options(&self) -> WireOptions {
        WireOptions {
            server_name: self.server_name.clone(),
            legacy_content_length_header: self.legacy_content_length_header,
        }
    }
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            server_name: "Muzhvay 0.1".to_string(),
            legacy_content_length_header: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.session.cookie_name, "MuSID");
        assert_eq!(config.session.ttl(), Duration::from_secs(1800));
        assert_eq!(config.session.reap_interval(), Duration::from_secs(1));
        assert_eq!(config.response.server_name, "Muzhvay 0.1");
        assert!(!config.response.legacy_content_length_header);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [session]
            ttl_secs = 60

            [timeouts]
            read_secs = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.session.ttl_secs, 60);
        assert_eq!(config.session.cookie_name, "MuSID");
        assert_eq!(config.timeouts.read(), None);
        assert_eq!(config.timeouts.write(), Some(Duration::from_secs(30)));
    }
}
