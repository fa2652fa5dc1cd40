//! Bastion API connection configuration.

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use bastion_core::error::{BastionError, BastionResult};

/// Connection timeouts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Connection timeout in seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_read_timeout() -> u64 {
    60
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connection_timeout_secs: default_connection_timeout(),
            read_timeout_secs: default_read_timeout(),
        }
    }
}

/// TLS settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TlsConfig {
    /// Whether to verify the server certificate.
    #[serde(default = "default_true")]
    pub verify_certificate: bool,
}

fn default_true() -> bool {
    true
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            verify_certificate: default_true(),
        }
    }
}

impl TlsConfig {
    /// Log a warning when certificate verification is disabled.
    pub fn warn_if_insecure(&self) {
        if !self.verify_certificate {
            warn!("TLS certificate verification is disabled");
        }
    }
}

/// Configuration for a Bastion API connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the appliance, e.g. `https://bastion.example.com`.
    pub base_url: String,

    /// API username.
    pub username: String,

    /// API password.
    pub password: String,

    /// TLS settings.
    #[serde(default)]
    pub tls: TlsConfig,

    /// Connection timeouts.
    #[serde(default)]
    pub connection: ConnectionSettings,
}

impl ApiConfig {
    /// Create a configuration with default TLS and timeout settings.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            tls: TlsConfig::default(),
            connection: ConnectionSettings::default(),
        }
    }

    /// Disable server certificate verification.
    pub fn with_insecure_tls(mut self) -> Self {
        self.tls.verify_certificate = false;
        self
    }

    /// Override the connection timeouts.
    pub fn with_connection(mut self, connection: ConnectionSettings) -> Self {
        self.connection = connection;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> BastionResult<()> {
        if self.base_url.is_empty() {
            return Err(BastionError::invalid_config("base_url is required"));
        }
        let url = Url::parse(&self.base_url)
            .map_err(|e| BastionError::invalid_config(format!("invalid base_url: {e}")))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(BastionError::invalid_config(format!(
                "unsupported scheme in base_url: {}",
                url.scheme()
            )));
        }
        if self.username.is_empty() {
            return Err(BastionError::invalid_config("username is required"));
        }
        Ok(())
    }

    /// Build an absolute URL from an API path.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Create a redacted copy for logging and display.
    pub fn redacted(&self) -> Self {
        Self {
            password: "***REDACTED***".to_string(),
            ..self.clone()
        }
    }
}
