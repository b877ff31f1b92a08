//! Method router for inbound JSON-RPC requests.
//!
//! | Method         | Handling                                          |
//! |----------------|---------------------------------------------------|
//! | `initialize`   | Server identity and tool capability               |
//! | `ping`         | Empty result                                      |
//! | `tools/list`   | Registry descriptors in registration order        |
//! | `tools/call`   | Runs the named tool, wraps its outcome            |
//! | *(other)*      | `-32601` method not found                         |
//!
//! Requests without an `id` are notifications: they are logged and never
//! answered, whatever their method.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, info_span, warn, Instrument};

use super::arguments::Arguments;
use super::protocol::{CallToolResult, ErrorObject, Request, RequestId, Response};
use super::registry::{ToolDescriptor, ToolRegistry};

/// Protocol revisions this server can speak, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-03-26", "2024-11-05"];

/// Revision offered when the client asks for one we do not support.
pub const LATEST_PROTOCOL_VERSION: &str = "2025-03-26";

/// Identity reported by `initialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
    /// Optional usage instructions for the client.
    pub instructions: Option<String>,
}

impl ServerInfo {
    /// Identity with no instructions.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            instructions: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeResult<'a> {
    protocol_version: &'a str,
    capabilities: Value,
    server_info: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ListToolsResult<'a> {
    tools: Vec<&'a ToolDescriptor>,
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Map<String, Value>>,
}

/// Routes requests to the built-in methods and registered tools.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    info: ServerInfo,
}

impl Dispatcher {
    /// Create a dispatcher over a frozen registry.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>, info: ServerInfo) -> Self {
        Self { registry, info }
    }

    /// The registry this dispatcher serves.
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one request.
    ///
    /// Returns exactly one response for a request with an `id` and none for
    /// a notification.
    pub async fn handle(&self, request: Request) -> Option<Response> {
        let Some(id) = request.id else {
            self.notification(&request.method);
            return None;
        };

        let outcome = match request.method.as_str() {
            "initialize" => self.initialize(request.params.as_ref()),
            "ping" => Ok(json!({})),
            "tools/list" => self.list_tools(),
            "tools/call" => self.call_tool(&id, request.params).await,
            other => {
                warn!(method = other, "unknown method");
                Err(ErrorObject::method_not_found(other))
            }
        };

        Some(match outcome {
            Ok(result) => Response::success(id, result),
            Err(error) => Response::failure(id, error),
        })
    }

    fn notification(&self, method: &str) {
        match method {
            "notifications/initialized" => info!(server = %self.info.name, "client initialized"),
            "notifications/cancelled" => debug!("client cancelled a request"),
            other => debug!(method = other, "ignoring notification"),
        }
    }

    fn initialize(&self, params: Option<&Value>) -> Result<Value, ErrorObject> {
        let requested = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str);
        let protocol_version = negotiate_version(requested);
        info!(
            requested = requested.unwrap_or("none"),
            protocol_version, "initialize"
        );

        let result = InitializeResult {
            protocol_version,
            capabilities: json!({ "tools": { "listChanged": false } }),
            server_info: json!({ "name": self.info.name, "version": self.info.version }),
            instructions: self.info.instructions.as_deref(),
        };
        serde_json::to_value(result).map_err(ErrorObject::internal)
    }

    fn list_tools(&self) -> Result<Value, ErrorObject> {
        let result = ListToolsResult {
            tools: self.registry.descriptors().collect(),
        };
        serde_json::to_value(result).map_err(ErrorObject::internal)
    }

    async fn call_tool(&self, id: &RequestId, params: Option<Value>) -> Result<Value, ErrorObject> {
        let params = params.ok_or_else(|| ErrorObject::invalid_params("missing params"))?;
        let params: CallToolParams =
            serde_json::from_value(params).map_err(ErrorObject::invalid_params)?;

        let tool = self
            .registry
            .get(&params.name)
            .ok_or_else(|| ErrorObject::tool_not_found(&params.name))?;

        let arguments = Arguments::new(params.arguments.unwrap_or_default());
        let span = info_span!("tools_call", tool = %params.name, request_id = ?id);

        let outcome = async {
            let outcome = tool.invoke(arguments).await;
            if outcome.is_error {
                info!(text = %outcome.text, "tool reported failure");
            } else {
                debug!("tool completed");
            }
            outcome
        }
        .instrument(span)
        .await;

        serde_json::to_value(CallToolResult::from(outcome)).map_err(ErrorObject::internal)
    }
}

/// Echo the requested revision when supported, otherwise offer the latest.
#[must_use]
pub fn negotiate_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|r| SUPPORTED_PROTOCOL_VERSIONS.iter().copied().find(|v| *v == r))
        .unwrap_or(LATEST_PROTOCOL_VERSION)
}
