//! Relay transport: outbound WebSocket connection presented as a
//! newline-framed byte stream.
//!
//! - `frame_buffer`: leftover bytes of a partially read message.
//! - `stream`: [`RelayStream`](stream::RelayStream), the read/write/close
//!   adapter with independent read and write locks.
//! - `connector`: URL and header construction plus the handshake.
//! - `keepalive`: periodic pings sharing the write lock.

pub mod connector;
pub mod frame_buffer;
pub mod keepalive;
pub mod stream;
