//! `add` tool: sums two numbers.

use serde_json::json;

use crate::mcp::arguments::{ArgumentError, Arguments};
use crate::mcp::registry::{ToolDescriptor, ToolOutcome};

/// Tool name.
pub const NAME: &str = "add";

/// Validated `add` arguments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AddArgs {
    /// First addend.
    pub a: f64,
    /// Second addend.
    pub b: f64,
}

impl TryFrom<&Arguments> for AddArgs {
    type Error = ArgumentError;

    fn try_from(args: &Arguments) -> Result<Self, Self::Error> {
        Ok(Self {
            a: args.require_f64("a")?,
            b: args.require_f64("b")?,
        })
    }
}

/// Listing entry for `add`.
#[must_use]
pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        NAME,
        "Add two numbers together.",
        json!({
            "type": "object",
            "properties": {
                "a": { "type": "number", "description": "First number" },
                "b": { "type": "number", "description": "Second number" }
            },
            "required": ["a", "b"]
        }),
    )
}

/// Handle an `add` call.
pub async fn handle(args: Arguments) -> ToolOutcome {
    match AddArgs::try_from(&args) {
        Ok(AddArgs { a, b }) => ToolOutcome::success(format!("Result: {a} + {b} = {}", a + b)),
        Err(err) => err.into(),
    }
}
