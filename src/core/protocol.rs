/// JSON-RPC 2.0 / MCP Wire Types
///
/// Request and response envelopes, the tool descriptor returned by
/// `tools/list`, and the content block returned by `tools/call`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC 2.0 request structure for MCP protocol.
///
/// Deserialized only after the envelope is known to be an object, so a
/// failure here means a required member is missing or has the wrong type.
#[derive(Deserialize, Debug)]
pub struct MCPRequest {
    /// JSON-RPC version identifier, must be "2.0"
    pub jsonrpc: String,
    /// Opaque request ID, echoed back unchanged. Absent is treated as null.
    #[serde(default)]
    pub id: Value,
    /// MCP method name (e.g., "tools/list", "tools/call")
    pub method: String,
    /// Method-specific parameters
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
///
/// `id` is always serialized, as `null` when the request had none. Exactly
/// one of `result` and `error` is present.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MCPResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MCPError>,
}

impl MCPResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: MCPError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC 2.0 error structure.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MCPError {
    /// JSON-RPC error code (e.g., -32601 for method not found)
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// MCP tool definition structure.
///
/// Each tool has a unique name, a description, and a JSON schema for its
/// arguments. Serialized as-is in `tools/list` responses.
#[derive(Serialize, Debug, Clone)]
pub struct MCPTool {
    pub name: String,
    pub description: String,
    /// JSON Schema defining the tool's input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// A single content item in a tool call result.
#[derive(Serialize, Debug, Clone)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

/// Result of a `tools/call` invocation. `isError` is always serialized.
#[derive(Serialize, Debug, Clone)]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn text(text: String) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text,
            }],
            is_error: false,
        }
    }

    pub fn error_text(text: String) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text,
            }],
            is_error: true,
        }
    }
}
