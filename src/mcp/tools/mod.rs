//! Built-in tools served to the relay.
//!
//! Each tool module exposes a `descriptor()` and an async `handle` that
//! takes the typed [`Arguments`](super::arguments::Arguments) and returns a
//! [`ToolOutcome`](super::registry::ToolOutcome).

pub mod add;
pub mod current_time;
pub mod echo;

use super::registry::ToolRegistry;
use crate::Result;

/// Registry with every built-in tool, in listing order.
///
/// # Errors
///
/// Returns `AppError::Registry` if two built-ins share a name.
pub fn default_registry() -> Result<ToolRegistry> {
    Ok(ToolRegistry::builder()
        .register(echo::descriptor(), echo::handle)?
        .register(add::descriptor(), add::handle)?
        .register(current_time::descriptor(), current_time::handle)?
        .build())
}
