//! Configuration parsing, command-line overrides, validation, and
//! credential loading.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::mcp::dispatcher::ServerInfo;
use crate::transport::connector::RelayTarget;
use crate::{AppError, Result};

/// Environment variable consulted for the relay credential.
pub const TOKEN_ENV_VAR: &str = "MCP_RELAY_TOKEN";

fn default_server_name() -> String {
    "mcp-relay-agent".into()
}

fn default_server_version() -> String {
    env!("CARGO_PKG_VERSION").into()
}

fn default_keepalive_seconds() -> u64 {
    30
}

fn default_close_timeout_ms() -> u64 {
    1000
}

/// Connector configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BridgeConfig {
    /// Relay `host:port`.
    #[serde(default)]
    pub relay_address: String,
    /// Identity announced to the relay and reported by `initialize`.
    #[serde(default = "default_server_name")]
    pub server_name: String,
    /// Version reported by `initialize`.
    #[serde(default = "default_server_version")]
    pub server_version: String,
    /// Use `wss` instead of `ws`.
    #[serde(default)]
    pub tls: bool,
    /// Accept any relay certificate (TLS only).
    #[serde(default)]
    pub insecure_skip_verify: bool,
    /// Bearer credential (populated at runtime, never read from TOML).
    #[serde(skip)]
    pub token: Option<String>,
    /// Seconds between keepalive pings; 0 disables them.
    #[serde(default = "default_keepalive_seconds")]
    pub keepalive_seconds: u64,
    /// Upper bound on sending the close frame at shutdown.
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,
    /// Optional usage instructions returned by `initialize`.
    #[serde(default)]
    pub instructions: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            relay_address: String::new(),
            server_name: default_server_name(),
            server_version: default_server_version(),
            tls: false,
            insecure_skip_verify: false,
            token: None,
            keepalive_seconds: default_keepalive_seconds(),
            close_timeout_ms: default_close_timeout_ms(),
            instructions: None,
        }
    }
}

/// Values given on the command line; each `Some`/`true` wins over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Relay `host:port`.
    pub relay_address: Option<String>,
    /// Server identity.
    pub server_name: Option<String>,
    /// Bearer credential.
    pub token: Option<String>,
    /// Force TLS on.
    pub tls: bool,
    /// Force certificate verification off.
    pub insecure_skip_verify: bool,
}

impl BridgeConfig {
    /// Parse configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// Validation is deferred to [`BridgeConfig::validate`] so command-line
    /// overrides can fill in missing values first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the TOML is invalid.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply command-line overrides.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(address) = overrides.relay_address {
            self.relay_address = address;
        }
        if let Some(name) = overrides.server_name {
            self.server_name = name;
        }
        if overrides.token.is_some() {
            self.token = overrides.token;
        }
        self.tls |= overrides.tls;
        self.insecure_skip_verify |= overrides.insecure_skip_verify;
    }

    /// Fill in the credential from [`TOKEN_ENV_VAR`] when none was given.
    ///
    /// An empty variable counts as unset.
    pub fn load_credentials(&mut self) {
        if self.token.is_some() {
            return;
        }
        match env::var(TOKEN_ENV_VAR) {
            Ok(token) if !token.trim().is_empty() => {
                debug!(var = TOKEN_ENV_VAR, "credential loaded from environment");
                self.token = Some(token.trim().to_owned());
            }
            _ => debug!("no relay credential configured"),
        }
    }

    /// Check that the configuration can produce a connection.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the relay address is missing or lacks
    /// a numeric port, or the server name is empty or not printable.
    pub fn validate(&self) -> Result<()> {
        let address = self.relay_address.trim();
        if address.is_empty() {
            return Err(AppError::Config("relay_address must be set".into()));
        }

        let port = address
            .rsplit_once(':')
            .filter(|(host, _)| !host.is_empty())
            .map(|(_, port)| port)
            .ok_or_else(|| {
                AppError::Config(format!("relay_address '{address}' must be host:port"))
            })?;
        port.parse::<u16>().map_err(|err| {
            AppError::Config(format!("relay_address '{address}' has invalid port: {err}"))
        })?;

        if self.server_name.trim().is_empty() {
            return Err(AppError::Config("server_name must not be empty".into()));
        }
        if self.server_name.chars().any(char::is_control) {
            return Err(AppError::Config(
                "server_name must not contain control characters".into(),
            ));
        }

        if self.token.as_deref().is_some_and(|t| t.chars().any(char::is_control)) {
            return Err(AppError::Config(
                "token must not contain control characters".into(),
            ));
        }

        Ok(())
    }

    /// Connection target derived from this configuration.
    #[must_use]
    pub fn target(&self) -> RelayTarget {
        RelayTarget {
            address: self.relay_address.trim().to_owned(),
            tls: self.tls,
            server_name: self.server_name.clone(),
            token: self.token.clone(),
            insecure_skip_verify: self.insecure_skip_verify,
        }
    }

    /// Identity reported to clients by `initialize`.
    #[must_use]
    pub fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: self.server_name.clone(),
            version: self.server_version.clone(),
            instructions: self.instructions.clone(),
        }
    }

    /// Keepalive period, or `None` when disabled.
    #[must_use]
    pub fn keepalive_interval(&self) -> Option<Duration> {
        (self.keepalive_seconds > 0).then(|| Duration::from_secs(self.keepalive_seconds))
    }

    /// Bound on delivering the close frame.
    #[must_use]
    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }
}
