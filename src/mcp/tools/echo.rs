//! `echo` tool: returns the caller's message.

use serde_json::json;

use crate::mcp::arguments::Arguments;
use crate::mcp::registry::{ToolDescriptor, ToolOutcome};

/// Tool name.
pub const NAME: &str = "echo";

/// Listing entry for `echo`.
#[must_use]
pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        NAME,
        "Echo back the provided message.",
        json!({
            "type": "object",
            "properties": {
                "message": { "type": "string", "description": "Text to echo back" }
            },
            "required": ["message"]
        }),
    )
}

/// Handle an `echo` call.
pub async fn handle(args: Arguments) -> ToolOutcome {
    match args.require_str("message") {
        Ok(message) => ToolOutcome::success(format!("Echo: {message}")),
        Err(err) => err.into(),
    }
}
