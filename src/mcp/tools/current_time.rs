//! `current_time` tool: reports the wall clock in RFC 3339.

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::json;

use crate::mcp::arguments::{ArgumentError, Arguments};
use crate::mcp::registry::{ToolDescriptor, ToolOutcome};

/// Tool name.
pub const NAME: &str = "current_time";

/// Widest offset accepted, in minutes either side of UTC.
pub const MAX_OFFSET_MINUTES: i64 = 14 * 60;

const OFFSET_ARG: &str = "timezone_offset_minutes";

/// Listing entry for `current_time`.
#[must_use]
pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        NAME,
        "Get the current date and time.",
        json!({
            "type": "object",
            "properties": {
                OFFSET_ARG: {
                    "type": "integer",
                    "description": "Offset from UTC in minutes; defaults to 0",
                    "minimum": -MAX_OFFSET_MINUTES,
                    "maximum": MAX_OFFSET_MINUTES
                }
            }
        }),
    )
}

/// Handle a `current_time` call.
pub async fn handle(args: Arguments) -> ToolOutcome {
    match offset(&args) {
        Ok(offset) => ToolOutcome::success(format!("Current time: {}", render(Utc::now(), offset))),
        Err(err) => err.into(),
    }
}

/// Format `now` in the given offset.
#[must_use]
pub fn render(now: DateTime<Utc>, offset: FixedOffset) -> String {
    now.with_timezone(&offset).to_rfc3339()
}

fn offset(args: &Arguments) -> Result<FixedOffset, ArgumentError> {
    let minutes = args.optional_i64(OFFSET_ARG)?.unwrap_or(0);
    let out_of_range = || ArgumentError::OutOfRange {
        name: OFFSET_ARG.to_owned(),
        accepted: format!("between -{MAX_OFFSET_MINUTES} and {MAX_OFFSET_MINUTES}"),
    };
    if minutes.unsigned_abs() > MAX_OFFSET_MINUTES.unsigned_abs() {
        return Err(out_of_range());
    }
    let seconds = i32::try_from(minutes * 60).map_err(|_| out_of_range())?;
    FixedOffset::east_opt(seconds).ok_or_else(out_of_range)
}
