//! Model Context Protocol server layer.
//!
//! - `protocol`: JSON-RPC 2.0 envelopes, error codes, tool result shape.
//! - `codec`: line framing with a length limit.
//! - `arguments`: typed extraction of tool arguments.
//! - `registry`: immutable tool registry.
//! - `dispatcher`: method routing.
//! - `engine`: the read/dispatch/write loop.
//! - `tools`: built-in tools.

pub mod arguments;
pub mod codec;
pub mod dispatcher;
pub mod engine;
pub mod protocol;
pub mod registry;
pub mod tools;
