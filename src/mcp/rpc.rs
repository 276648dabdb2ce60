//! JSON-RPC protocol representations and formatting utilities
//!
//! Maps internal `AppError`s onto JSON-RPC error objects and wraps results in
//! `rust_mcp_sdk` response envelopes.

use rust_mcp_sdk::schema::{
    JsonrpcErrorResponse, JsonrpcResultResponse, RequestId, Result as McpResult, RpcError,
};
use serde_json::{json, Value};

use crate::errors::AppError;

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

pub fn is_json_rpc_error(value: &Value) -> bool {
    value.get("error").is_some()
}

pub fn app_error_to_json_rpc(id: Option<Value>, err: AppError) -> Value {
    match err {
        AppError::BadRequest { code, message } => json_rpc_error_with_data(
            id,
            INVALID_PARAMS,
            "Invalid params",
            Some(json!({
                "code": code,
                "message": message,
            })),
        ),
        // Only validation failures reach the JSON-RPC layer as `AppError`s.
        other => {
            tracing::error!(error = %other, "unexpected error in json-rpc handling");
            json_rpc_error(id, INTERNAL_ERROR, "Internal error")
        }
    }
}

pub fn json_rpc_error(id: Option<Value>, code: i32, message: &str) -> Value {
    json_rpc_error_with_data(id, code, message, None)
}

pub fn json_rpc_error_with_data(
    id: Option<Value>,
    code: i32,
    message: &str,
    data: Option<Value>,
) -> Value {
    let response = JsonrpcErrorResponse::new(
        RpcError {
            code: i64::from(code),
            data,
            message: message.to_string(),
        },
        id.as_ref().and_then(value_to_request_id),
    );
    serde_json::to_value(response).expect("jsonrpc error response serialization")
}

pub fn json_rpc_result(id: Option<Value>, result: Value) -> Value {
    if let Some(request_id) = id.as_ref().and_then(value_to_request_id) {
        let extra = result.as_object().cloned();
        let response = JsonrpcResultResponse::new(request_id, McpResult { meta: None, extra });
        return serde_json::to_value(response).expect("jsonrpc result response serialization");
    }

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub fn value_to_request_id(value: &Value) -> Option<RequestId> {
    if let Some(string_id) = value.as_str() {
        return Some(RequestId::String(string_id.to_string()));
    }

    value.as_i64().map(RequestId::Integer)
}

pub fn request_id_to_value(id: RequestId) -> Value {
    match id {
        RequestId::String(value) => Value::String(value),
        RequestId::Integer(value) => Value::Number(value.into()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn error_envelope_keeps_request_id() {
        let value = json_rpc_error(Some(json!(7)), METHOD_NOT_FOUND, "Method not found");

        assert!(is_json_rpc_error(&value));
        assert_eq!(value["id"], 7);
        assert_eq!(value["error"]["code"], METHOD_NOT_FOUND);
    }

    #[test]
    fn bad_request_maps_to_invalid_params() {
        let value = app_error_to_json_rpc(
            Some(json!("abc")),
            AppError::bad_request("invalid_protocol_version", "missing version"),
        );

        assert_eq!(value["id"], "abc");
        assert_eq!(value["error"]["code"], INVALID_PARAMS);
        assert_eq!(value["error"]["data"]["code"], "invalid_protocol_version");
    }

    #[test]
    fn other_errors_are_masked_as_internal() {
        let value = app_error_to_json_rpc(Some(json!(3)), AppError::internal("disk on fire"));

        assert_eq!(value["error"]["code"], INTERNAL_ERROR);
        assert_eq!(value["error"]["message"], "Internal error");
        assert!(value["error"]["data"].is_null());
    }

    #[test]
    fn result_envelope_wraps_object() {
        let value = json_rpc_result(Some(json!(1)), json!({"tools": []}));

        assert!(!is_json_rpc_error(&value));
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["result"]["tools"], json!([]));
    }
}
