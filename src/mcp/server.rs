//! The central Model Context Protocol engine
//!
//! Decodes JSON-RPC messages, negotiates the protocol version on `initialize` and
//! routes `tools/*` methods to the calculator tools. Both HTTP framings (`/mcp`
//! and `/sse/message`) feed their payloads through [`dispatch_payload`].

use rust_mcp_sdk::schema::{
    CallToolRequest, Implementation, InitializeRequest, InitializeResult, JsonrpcMessage,
    JsonrpcRequest, ListToolsRequest, ListToolsResult, PingRequest, ServerCapabilities,
    ServerCapabilitiesTools,
};
use serde_json::{json, Value};
use tracing::info;

use crate::domain::tools::{build_tools_list, handle_tools_call};
use crate::errors::AppError;
use crate::mcp::rpc::{
    app_error_to_json_rpc, is_json_rpc_error, json_rpc_error, json_rpc_result,
    request_id_to_value, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND,
};

pub const SERVER_NAME: &str = "Secured Calculator";
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2024-11-05", "2025-03-26", "2025-06-18"];
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

/// Handles a single message or a batch. `None` means nothing needs to be sent back.
pub fn dispatch_payload(payload: Value) -> Option<Value> {
    let Some(batch) = payload.as_array() else {
        return handle_json_rpc_value(payload);
    };

    if batch.is_empty() {
        return Some(Value::Array(vec![json_rpc_error(
            None,
            INVALID_REQUEST,
            "Invalid Request",
        )]));
    }

    let responses = batch
        .iter()
        .filter_map(|item| handle_json_rpc_value(item.clone()))
        .collect::<Vec<_>>();

    if responses.is_empty() {
        None
    } else {
        Some(Value::Array(responses))
    }
}

pub fn handle_json_rpc_value(payload: Value) -> Option<Value> {
    if !payload.is_object() {
        return Some(json_rpc_error(None, INVALID_REQUEST, "Invalid Request"));
    }

    let request_id = payload.get("id").cloned();
    let parsed: JsonrpcMessage = match serde_json::from_value(payload) {
        Ok(message) => message,
        Err(_) => return Some(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request")),
    };

    match parsed {
        JsonrpcMessage::Request(request) => {
            if let Err(error_response) = validate_request_shape(&request) {
                return Some(error_response);
            }

            let request_id = request_id_to_value(request.id);
            if request.method.trim().is_empty() {
                return Some(json_rpc_error(
                    Some(request_id),
                    INVALID_REQUEST,
                    "Invalid Request",
                ));
            }

            Some(handle_json_rpc_request(
                Some(request_id),
                request.method,
                request.params.map(Value::Object),
            ))
        }
        JsonrpcMessage::Notification(notification) => {
            if !notification.method.trim().is_empty() {
                info!(method = %notification.method, "mcp notification received");
            }
            None
        }
        JsonrpcMessage::ResultResponse(_) | JsonrpcMessage::ErrorResponse(_) => {
            Some(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request"))
        }
    }
}

pub fn validate_request_shape(request: &JsonrpcRequest) -> Result<(), Value> {
    let payload = serde_json::to_value(request).expect("jsonrpc request serialization");
    let request_id = Some(request_id_to_value(request.id.clone()));

    let valid = match request.method.as_str() {
        "tools/call" => serde_json::from_value::<CallToolRequest>(payload).is_ok(),
        "tools/list" => serde_json::from_value::<ListToolsRequest>(payload).is_ok(),
        "ping" => serde_json::from_value::<PingRequest>(payload).is_ok(),
        "initialize" => serde_json::from_value::<InitializeRequest>(payload).is_ok(),
        _ => true,
    };

    if valid {
        Ok(())
    } else {
        Err(json_rpc_error(request_id, INVALID_PARAMS, "Invalid params"))
    }
}

pub fn handle_json_rpc_request(id: Option<Value>, method: String, params: Option<Value>) -> Value {
    let tool = params
        .as_ref()
        .filter(|_| method == "tools/call")
        .and_then(|params| params.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let response = match method.as_str() {
        "initialize" => {
            let protocol_version = match negotiate_protocol_version(params.as_ref()) {
                Ok(version) => version,
                Err(err) => return app_error_to_json_rpc(id, err),
            };

            let initialize_result = InitializeResult {
                server_info: Implementation {
                    name: SERVER_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    title: None,
                    description: None,
                    icons: vec![],
                    website_url: None,
                },
                capabilities: ServerCapabilities {
                    tools: Some(ServerCapabilitiesTools {
                        list_changed: Some(false),
                    }),
                    resources: None,
                    prompts: None,
                    ..Default::default()
                },
                protocol_version: protocol_version.to_string(),
                instructions: None,
                meta: None,
            };

            json_rpc_result(
                id,
                serde_json::to_value(initialize_result).expect("initialize result serialization"),
            )
        }
        "ping" => json_rpc_result(id, json!({})),
        "tools/list" => json_rpc_result(
            id,
            serde_json::to_value(ListToolsResult {
                meta: None,
                next_cursor: None,
                tools: build_tools_list(),
            })
            .expect("tools list result serialization"),
        ),
        "tools/call" => handle_tools_call(id, params),
        _ => json_rpc_error(id, METHOD_NOT_FOUND, "Method not found"),
    };

    info!(
        method = %method,
        tool = tool.as_deref().unwrap_or("-"),
        outcome = if is_json_rpc_error(&response) { "failure" } else { "success" },
        "mcp action audited"
    );

    response
}

/// Echoes the client's version when supported, otherwise answers with the latest.
pub fn negotiate_protocol_version(params: Option<&Value>) -> Result<&'static str, AppError> {
    let offered_version = params
        .and_then(Value::as_object)
        .and_then(|object| object.get("protocolVersion"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .ok_or_else(|| {
            AppError::bad_request(
                "invalid_protocol_version",
                "initialize params.protocolVersion is required",
            )
        })?;

    Ok(SUPPORTED_PROTOCOL_VERSIONS
        .into_iter()
        .find(|supported| *supported == offered_version)
        .unwrap_or(LATEST_PROTOCOL_VERSION))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn negotiate_protocol_version_echoes_supported_version() {
        let params = json!({ "protocolVersion": "2024-11-05" });

        let version = negotiate_protocol_version(Some(&params)).expect("supported version");
        assert_eq!(version, "2024-11-05");
    }

    #[test]
    fn negotiate_protocol_version_falls_back_to_latest() {
        let params = json!({ "protocolVersion": "2099-01-01" });

        let version = negotiate_protocol_version(Some(&params)).expect("fallback version");
        assert_eq!(version, LATEST_PROTOCOL_VERSION);
    }

    #[test]
    fn negotiate_protocol_version_requires_a_version() {
        let error = negotiate_protocol_version(Some(&json!({}))).expect_err("missing version");
        assert!(error.to_string().contains("bad request"));
    }

    #[test]
    fn notifications_produce_no_response() {
        let payload = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
        assert!(dispatch_payload(payload).is_none());
    }

    #[test]
    fn non_object_payload_is_invalid_request() {
        let response = dispatch_payload(json!(42)).expect("error response");
        assert_eq!(response["error"]["code"], INVALID_REQUEST);
    }

    #[test]
    fn empty_batch_is_invalid_request() {
        let response = dispatch_payload(json!([])).expect("error response");
        assert_eq!(response[0]["error"]["code"], INVALID_REQUEST);
    }

    #[test]
    fn batch_answers_requests_and_skips_notifications() {
        let payload = json!([
            { "jsonrpc": "2.0", "id": 1, "method": "ping" },
            { "jsonrpc": "2.0", "method": "notifications/initialized" },
            { "jsonrpc": "2.0", "id": 2, "method": "tools/list" }
        ]);

        let response = dispatch_payload(payload).expect("batch response");
        let responses = response.as_array().expect("array response");
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["result"]["tools"][1]["name"], "calculate");
    }

    #[test]
    fn unknown_method_is_method_not_found() {
        let response = handle_json_rpc_request(Some(json!(9)), "resources/list".to_string(), None);
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);
    }

    #[test]
    fn repeated_calls_yield_identical_results() {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 5,
            "method": "tools/call",
            "params": { "name": "calculate", "arguments": { "operation": "multiply", "a": 3, "b": 4 } }
        });

        let first = dispatch_payload(payload.clone());
        let second = dispatch_payload(payload);
        assert_eq!(first, second);
    }
}
