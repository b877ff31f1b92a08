//! Immutable tool registry.
//!
//! Built once at startup with [`ToolRegistryBuilder`] and shared with the
//! dispatcher behind an `Arc`. Listing order is registration order.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::arguments::Arguments;
use super::protocol::{CallToolResult, Content};
use crate::{AppError, Result};

/// Boxed future returned by a tool handler.
pub type ToolFuture = Pin<Box<dyn Future<Output = ToolOutcome> + Send>>;

/// Type-erased tool handler.
pub type ToolHandler = Arc<dyn Fn(Arguments) -> ToolFuture + Send + Sync>;

/// Public description of a tool as returned by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema of the argument object.
    pub input_schema: Value,
}

impl ToolDescriptor {
    /// Describe a tool.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Application-level result of running a tool.
///
/// A failed outcome is still delivered as a successful JSON-RPC response,
/// flagged with `isError: true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    /// Text returned to the caller.
    pub text: String,
    /// Whether the tool failed.
    pub is_error: bool,
}

impl ToolOutcome {
    /// Successful outcome.
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    /// Failed outcome.
    #[must_use]
    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

impl From<ToolOutcome> for CallToolResult {
    fn from(outcome: ToolOutcome) -> Self {
        Self {
            content: vec![Content::Text { text: outcome.text }],
            is_error: outcome.is_error,
        }
    }
}

/// A descriptor paired with its handler.
pub struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: ToolHandler,
}

impl RegisteredTool {
    /// The tool's public description.
    #[must_use]
    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Run the handler.
    pub async fn invoke(&self, arguments: Arguments) -> ToolOutcome {
        (self.handler)(arguments).await
    }
}

impl fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Ordered, immutable set of tools.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    /// Start building a registry.
    #[must_use]
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter().map(RegisteredTool::descriptor)
    }

    /// Look up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.iter().find(|t| t.descriptor.name == name)
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Builder for [`ToolRegistry`].
#[derive(Debug, Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistryBuilder {
    /// Add a tool.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Registry` when the name is empty or already
    /// registered, or when the input schema is not a JSON object.
    pub fn register<F, Fut>(mut self, descriptor: ToolDescriptor, handler: F) -> Result<Self>
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolOutcome> + Send + 'static,
    {
        if descriptor.name.is_empty() {
            return Err(AppError::Registry("tool name must not be empty".into()));
        }
        if self.tools.iter().any(|t| t.descriptor.name == descriptor.name) {
            return Err(AppError::Registry(format!(
                "duplicate tool name: {}",
                descriptor.name
            )));
        }
        if !descriptor.input_schema.is_object() {
            return Err(AppError::Registry(format!(
                "input schema for {} must be a json object",
                descriptor.name
            )));
        }

        let handler: ToolHandler =
            Arc::new(move |args: Arguments| -> ToolFuture { Box::pin(handler(args)) });
        self.tools.push(RegisteredTool {
            descriptor,
            handler,
        });
        Ok(self)
    }

    /// Freeze the registry.
    #[must_use]
    pub fn build(self) -> ToolRegistry {
        ToolRegistry { tools: self.tools }
    }
}
