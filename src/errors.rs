//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// The WebSocket handshake with the relay failed.
    Connect {
        /// Relay URL with the credential redacted.
        url: String,
        /// HTTP status returned by the relay, when it answered with one.
        status: Option<u16>,
        /// Underlying transport error text.
        reason: String,
    },
    /// Mid-session transport failure on an established connection.
    Transport(String),
    /// Line framing failure (oversized or invalid UTF-8 frame).
    Codec(String),
    /// JSON-RPC envelope could not be decoded or encoded.
    Protocol(String),
    /// Tool registry construction failure.
    Registry(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Connect {
                url,
                status: Some(code),
                reason,
            } => write!(f, "connect: {url} rejected with http status {code}: {reason}"),
            Self::Connect {
                url,
                status: None,
                reason,
            } => write!(f, "connect: {url}: {reason}"),
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::Codec(msg) => write!(f, "codec: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol: {msg}"),
            Self::Registry(msg) => write!(f, "registry: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
