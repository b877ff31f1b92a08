#![forbid(unsafe_code)]

//! Expose a line-framed MCP tool server through an outbound WebSocket
//! connection to a central relay.

pub mod config;
pub mod errors;
pub mod lifecycle;
pub mod mcp;
pub mod transport;

pub use config::BridgeConfig;
pub use errors::{AppError, Result};
