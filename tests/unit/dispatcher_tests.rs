//! Unit tests for JSON-RPC method routing and the `tools/call` result
//! envelope.
//!
//! Covers:
//! - `initialize` reports identity, tool capability, and negotiated version
//! - `tools/list` is ordered, repeatable, and empty for an empty registry
//! - `tools/call` success and tool-level failure wire shapes
//! - unknown tool and unknown method map to `-32601`
//! - malformed `tools/call` params map to `-32602`
//! - notifications get no response; string ids are mirrored

use std::sync::Arc;

use serde_json::{json, Value};

use mcp_relay_agent::mcp::dispatcher::{Dispatcher, ServerInfo, LATEST_PROTOCOL_VERSION};
use mcp_relay_agent::mcp::protocol::{
    decode_request, encode_response, RequestId, Response, INVALID_PARAMS, METHOD_NOT_FOUND,
};
use mcp_relay_agent::mcp::registry::ToolRegistry;
use mcp_relay_agent::mcp::tools::default_registry;

fn dispatcher() -> Dispatcher {
    let registry = Arc::new(default_registry().expect("built-in registry"));
    Dispatcher::new(registry, ServerInfo::new("test-server", "1.2.3"))
}

async fn call(dispatcher: &Dispatcher, frame: Value) -> Option<Response> {
    let request = decode_request(&frame.to_string()).expect("valid request");
    dispatcher.handle(request).await
}

async fn result_of(dispatcher: &Dispatcher, frame: Value) -> Value {
    let response = call(dispatcher, frame).await.expect("response");
    response.result().cloned().expect("success response")
}

fn tool_call(id: i64, name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments }
    })
}

// ── initialize ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn initialize_reports_identity_and_tools_capability() {
    let d = dispatcher();
    let result = result_of(
        &d,
        json!({"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05"}}),
    )
    .await;

    assert_eq!(result["serverInfo"]["name"], "test-server");
    assert_eq!(result["serverInfo"]["version"], "1.2.3");
    assert!(result["capabilities"]["tools"].is_object());
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert!(result.get("instructions").is_none());
}

#[tokio::test]
async fn initialize_without_params_offers_latest_version() {
    let d = dispatcher();
    let result = result_of(&d, json!({"jsonrpc":"2.0","id":1,"method":"initialize"})).await;
    assert_eq!(result["protocolVersion"], LATEST_PROTOCOL_VERSION);
}

#[tokio::test]
async fn initialize_includes_configured_instructions() {
    let registry = Arc::new(ToolRegistry::builder().build());
    let mut info = ServerInfo::new("s", "0.1.0");
    info.instructions = Some("use echo".into());
    let d = Dispatcher::new(registry, info);

    let result = result_of(&d, json!({"jsonrpc":"2.0","id":1,"method":"initialize"})).await;
    assert_eq!(result["instructions"], "use echo");
}

#[tokio::test]
async fn ping_returns_empty_object() {
    let d = dispatcher();
    let result = result_of(&d, json!({"jsonrpc":"2.0","id":9,"method":"ping"})).await;
    assert_eq!(result, json!({}));
}

// ── tools/list ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn tools_list_preserves_registration_order() {
    let d = dispatcher();
    let result = result_of(&d, json!({"jsonrpc":"2.0","id":2,"method":"tools/list"})).await;

    let names: Vec<&str> = result["tools"]
        .as_array()
        .expect("tools array")
        .iter()
        .map(|t| t["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, ["echo", "add", "current_time"]);

    let echo = &result["tools"][0];
    assert!(echo["description"].is_string());
    assert_eq!(echo["inputSchema"]["type"], "object");
    assert_eq!(echo["inputSchema"]["required"], json!(["message"]));
}

#[tokio::test]
async fn tools_list_is_repeatable() {
    let d = dispatcher();
    let frame = json!({"jsonrpc":"2.0","id":2,"method":"tools/list"});
    let first = result_of(&d, frame.clone()).await;
    let second = result_of(&d, frame).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn tools_list_on_empty_registry_is_empty_array() {
    let d = Dispatcher::new(
        Arc::new(ToolRegistry::builder().build()),
        ServerInfo::new("empty", "0.0.0"),
    );
    let result = result_of(&d, json!({"jsonrpc":"2.0","id":2,"method":"tools/list"})).await;
    assert_eq!(result, json!({"tools": []}));
}

// ── tools/call ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_call_has_exact_wire_shape() {
    let d = dispatcher();
    let result = result_of(&d, tool_call(3, "add", json!({"a": 2, "b": 3}))).await;
    assert_eq!(
        result,
        json!({"content":[{"type":"text","text":"Result: 2 + 3 = 5"}],"isError":false})
    );
}

#[tokio::test]
async fn echo_call_returns_message() {
    let d = dispatcher();
    let result = result_of(&d, tool_call(4, "echo", json!({"message": "hello"}))).await;
    assert_eq!(result["content"][0]["text"], "Echo: hello");
    assert_eq!(result["isError"], false);
}

#[tokio::test]
async fn tool_failure_is_a_result_not_an_error() {
    let d = dispatcher();
    let response = call(&d, tool_call(5, "echo", json!({})))
        .await
        .expect("response");
    assert!(response.error().is_none());
    assert_eq!(
        response.result().expect("result"),
        &json!({"content":[{"type":"text","text":"Error: message argument required"}],"isError":true})
    );
}

#[tokio::test]
async fn call_without_arguments_member_reaches_tool() {
    let d = dispatcher();
    let result = result_of(
        &d,
        json!({"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"current_time"}}),
    )
    .await;
    let text = result["content"][0]["text"].as_str().expect("text");
    assert!(text.starts_with("Current time: "), "{text}");
    assert_eq!(result["isError"], false);
}

#[tokio::test]
async fn unknown_tool_is_method_not_found() {
    let d = dispatcher();
    let response = call(&d, tool_call(7, "nope", json!({}))).await.expect("response");
    let error = response.error().expect("error");
    assert_eq!(error.code, METHOD_NOT_FOUND);
    assert!(error.message.contains("nope"));
}

#[tokio::test]
async fn malformed_call_params_are_invalid_params() {
    let d = dispatcher();
    for params in [json!(null), json!({"arguments": {}}), json!({"name": 5}), json!([1, 2])] {
        let frame = json!({"jsonrpc":"2.0","id":8,"method":"tools/call","params":params});
        let response = call(&d, frame).await.expect("response");
        assert_eq!(
            response.error().expect("error").code,
            INVALID_PARAMS,
            "params {params}"
        );
    }
}

#[tokio::test]
async fn unknown_method_names_the_method() {
    let d = dispatcher();
    let response = call(&d, json!({"jsonrpc":"2.0","id":10,"method":"resources/list"}))
        .await
        .expect("response");
    let error = response.error().expect("error");
    assert_eq!(error.code, METHOD_NOT_FOUND);
    assert!(error.message.contains("resources/list"));
}

// ── envelope handling ──────────────────────────────────────────────────────

#[tokio::test]
async fn notifications_get_no_response() {
    let d = dispatcher();
    for method in ["notifications/initialized", "tools/list", "unknown/thing"] {
        assert!(call(&d, json!({"jsonrpc":"2.0","method":method})).await.is_none());
    }
}

#[tokio::test]
async fn string_id_is_mirrored() {
    let d = dispatcher();
    let response = call(&d, json!({"jsonrpc":"2.0","id":"abc-1","method":"ping"}))
        .await
        .expect("response");
    assert_eq!(response.id, RequestId::String("abc-1".into()));

    let wire: Value = serde_json::from_str(&encode_response(&response).expect("encode"))
        .expect("json");
    assert_eq!(wire, json!({"jsonrpc":"2.0","id":"abc-1","result":{}}));
}

#[tokio::test]
async fn large_numeric_id_is_answered_and_mirrored() {
    let d = dispatcher();
    let frame = r#"{"jsonrpc":"2.0","id":18446744073709551615,"method":"ping"}"#;
    let request = decode_request(frame).expect("u64::MAX id is valid");
    let response = d.handle(request).await.expect("request with id gets a response");

    let wire = encode_response(&response).expect("encode");
    assert!(wire.contains(r#""id":18446744073709551615"#), "{wire}");
}

#[tokio::test]
async fn error_response_wire_shape() {
    let d = dispatcher();
    let response = call(&d, json!({"jsonrpc":"2.0","id":11,"method":"bogus"}))
        .await
        .expect("response");
    let wire: Value = serde_json::from_str(&encode_response(&response).expect("encode"))
        .expect("json");
    assert_eq!(wire["jsonrpc"], "2.0");
    assert_eq!(wire["id"], 11);
    assert_eq!(wire["error"]["code"], -32601);
    assert!(wire.get("result").is_none());
}
