//! Calculator tools exposed via Model Context Protocol
//!
//! Each tool is a typed argument struct whose input schema is derived by the
//! `rust_mcp_sdk` macros. `tools/call` deserializes the arguments into that struct
//! before any arithmetic runs.

use rust_mcp_sdk::{
    macros,
    schema::{CallToolRequestParams, CallToolResult, ContentBlock, TextContent, Tool},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::calculator::{self, format_number, Operation};
use crate::mcp::rpc::{
    json_rpc_error, json_rpc_error_with_data, json_rpc_result, INVALID_PARAMS, METHOD_NOT_FOUND,
};

#[macros::mcp_tool(name = "add", description = "Add two numbers")]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct AddTool {
    /// First addend
    pub a: f64,
    /// Second addend
    pub b: f64,
}

#[macros::mcp_tool(
    name = "calculate",
    description = "Apply add, subtract, multiply or divide to two numbers"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct CalculateTool {
    /// Arithmetic operation to apply
    pub operation: Operation,
    /// Left operand
    pub a: f64,
    /// Right operand
    pub b: f64,
}

/// A validated tool invocation.
#[derive(Debug)]
pub enum CalculatorTool {
    Add(AddTool),
    Calculate(CalculateTool),
}

#[derive(Debug, PartialEq, Eq)]
pub enum ToolCallError {
    UnknownTool(String),
    InvalidArguments,
}

impl CalculatorTool {
    pub fn from_call(
        name: &str,
        arguments: serde_json::Map<String, Value>,
    ) -> Result<Self, ToolCallError> {
        let arguments = Value::Object(arguments);
        match name {
            "add" => serde_json::from_value(arguments)
                .map(Self::Add)
                .map_err(|_| ToolCallError::InvalidArguments),
            "calculate" => serde_json::from_value(arguments)
                .map(Self::Calculate)
                .map_err(|_| ToolCallError::InvalidArguments),
            other => Err(ToolCallError::UnknownTool(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Calculate(_) => "calculate",
        }
    }

    pub fn run(&self) -> String {
        match self {
            Self::Add(AddTool { a, b }) => format_number(calculator::add(*a, *b)),
            Self::Calculate(CalculateTool { operation, a, b }) => {
                calculator::calculate(*operation, *a, *b).render()
            }
        }
    }
}

pub fn build_tools_list() -> Vec<Tool> {
    vec![AddTool::tool(), CalculateTool::tool()]
}

pub fn text_result(text: String) -> CallToolResult {
    CallToolResult {
        content: vec![ContentBlock::from(TextContent::new(text, None, None))],
        is_error: None,
        meta: None,
        structured_content: None,
    }
}

pub fn handle_tools_call(id: Option<Value>, params: Option<Value>) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    };

    let tool_call: CallToolRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
    };

    let tool = match CalculatorTool::from_call(
        &tool_call.name,
        tool_call.arguments.unwrap_or_default(),
    ) {
        Ok(tool) => tool,
        Err(ToolCallError::InvalidArguments) => {
            return json_rpc_error(id, INVALID_PARAMS, "Invalid params")
        }
        Err(ToolCallError::UnknownTool(name)) => {
            return json_rpc_error_with_data(
                id,
                METHOD_NOT_FOUND,
                "Method not found",
                Some(json!({
                    "code": "tool_not_found",
                    "message": "unknown tool name",
                    "details": {
                        "name": name,
                    },
                })),
            )
        }
    };

    let text = tool.run();
    debug!(tool = tool.name(), result = %text, "tool executed");

    json_rpc_result(
        id,
        serde_json::to_value(text_result(text)).expect("tool result serialization"),
    )
}
