//! JSON-RPC 2.0 envelopes and MCP result shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::{AppError, Result};

/// JSON-RPC protocol version carried on every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// The method or tool does not exist.
pub const METHOD_NOT_FOUND: i32 = -32601;

/// The parameters could not be decoded.
pub const INVALID_PARAMS: i32 = -32602;

/// The server failed to produce a result.
pub const INTERNAL_ERROR: i32 = -32603;

/// Request identifier; a string or any JSON number, mirrored as received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric identifier.
    Number(Number),
    /// String identifier.
    String(String),
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

/// Inbound request or notification.
///
/// An absent or `null` `id` marks a notification.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Request {
    /// Protocol version; must be `"2.0"`.
    pub jsonrpc: String,
    /// Correlation identifier.
    #[serde(default)]
    pub id: Option<RequestId>,
    /// Method name.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Option<Value>,
}

impl Request {
    /// Whether this message expects no response.
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Error member of a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Numeric error code.
    pub code: i32,
    /// Human-readable description.
    pub message: String,
}

impl ErrorObject {
    /// Unknown method.
    #[must_use]
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: METHOD_NOT_FOUND,
            message: format!("method not found: {method}"),
        }
    }

    /// Unknown tool; shares the method-not-found code.
    #[must_use]
    pub fn tool_not_found(name: &str) -> Self {
        Self {
            code: METHOD_NOT_FOUND,
            message: format!("tool not found: {name}"),
        }
    }

    /// Parameters that could not be decoded.
    #[must_use]
    pub fn invalid_params(detail: impl std::fmt::Display) -> Self {
        Self {
            code: INVALID_PARAMS,
            message: format!("invalid params: {detail}"),
        }
    }

    /// Result that could not be produced.
    #[must_use]
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        Self {
            code: INTERNAL_ERROR,
            message: format!("internal error: {detail}"),
        }
    }
}

/// Exactly one of `result` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Successful result payload.
    Result(Value),
    /// Protocol-level failure.
    Error(ErrorObject),
}

/// Outbound response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Protocol version; always `"2.0"`.
    pub jsonrpc: String,
    /// Identifier copied from the request.
    pub id: RequestId,
    /// Result or error member.
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Response {
    /// Successful response.
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            outcome: Outcome::Result(result),
        }
    }

    /// Error response.
    #[must_use]
    pub fn failure(id: RequestId, error: ErrorObject) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            outcome: Outcome::Error(error),
        }
    }

    /// The result payload, if this is a success.
    #[must_use]
    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Result(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    /// The error member, if this is a failure.
    #[must_use]
    pub fn error(&self) -> Option<&ErrorObject> {
        match &self.outcome {
            Outcome::Result(_) => None,
            Outcome::Error(err) => Some(err),
        }
    }
}

/// One element of a tool result's `content` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    /// Plain text.
    Text {
        /// The text payload.
        text: String,
    },
}

/// Result shape of `tools/call`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Content blocks.
    pub content: Vec<Content>,
    /// Whether the tool reported an application-level failure.
    pub is_error: bool,
}

/// Decode one frame into a [`Request`].
///
/// # Errors
///
/// Returns `AppError::Protocol` when the frame is not JSON, is not a
/// request envelope, or carries a version other than `"2.0"`.
pub fn decode_request(line: &str) -> Result<Request> {
    let request: Request =
        serde_json::from_str(line).map_err(|e| AppError::Protocol(format!("malformed json: {e}")))?;

    if request.jsonrpc != JSONRPC_VERSION {
        return Err(AppError::Protocol(format!(
            "unsupported jsonrpc version: {}",
            request.jsonrpc
        )));
    }

    Ok(request)
}

/// Encode a [`Response`] as a single-line JSON string without delimiter.
///
/// # Errors
///
/// Returns `AppError::Protocol` if serialization fails.
pub fn encode_response(response: &Response) -> Result<String> {
    serde_json::to_string(response)
        .map_err(|e| AppError::Protocol(format!("failed to encode response: {e}")))
}
