/// Error Types for the MCP Tool Server
///
/// Three families of failure exist and each maps onto exactly one wire shape:
/// - `RpcError`: protocol-level problems, sent as a JSON-RPC `error` object
/// - `ToolError`: handler-level problems, sent as a successful `tools/call`
///   result carrying `isError: true`
/// - `RegistryError` / `ConfigError`: startup problems, never sent on the wire

use std::path::PathBuf;

use serde_json::Value;

use crate::core::collaborator::LookupError;
use crate::core::protocol::MCPError;

// JSON-RPC 2.0 standard error codes.
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// Protocol-level failures produced while normalizing or dispatching a request.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("parse error: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("method not found: {method}")]
    MethodNotFound { method: String },

    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("invalid params: {message}")]
    InvalidParams { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl RpcError {
    /// Convert to the JSON-RPC error object sent on the wire.
    pub fn to_jsonrpc_error(&self) -> MCPError {
        match self {
            RpcError::Parse { source } => MCPError {
                code: PARSE_ERROR,
                message: format!("Parse error: {source}"),
                data: None,
            },
            RpcError::InvalidRequest { message } => MCPError {
                code: INVALID_REQUEST,
                message: format!("Invalid Request: {message}"),
                data: None,
            },
            RpcError::MethodNotFound { method } => MCPError {
                code: METHOD_NOT_FOUND,
                message: format!("Method not found: {method}"),
                data: None,
            },
            RpcError::UnknownTool { name } => MCPError {
                code: METHOD_NOT_FOUND,
                message: format!("Unknown tool: {name}"),
                data: Some(Value::String(name.clone())),
            },
            RpcError::InvalidParams { message } => MCPError {
                code: INVALID_PARAMS,
                message: format!("Invalid params: {message}"),
                data: None,
            },
            RpcError::Internal { message } => MCPError {
                code: INTERNAL_ERROR,
                message: "Internal error".to_string(),
                data: Some(Value::String(message.clone())),
            },
        }
    }
}

/// Failures reported by a tool handler.
///
/// The `Display` text is what the caller reads in `content[0].text` (after an
/// `Error: ` prefix), so every message has to stand on its own.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Missing required parameter: {0}")]
    MissingArgument(String),

    #[error("Parameter '{name}' must be of type {expected}")]
    InvalidType { name: String, expected: String },

    #[error("Unexpected parameter: {0}")]
    UnexpectedArgument(String),

    #[error("{0}")]
    Domain(String),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

impl ToolError {
    pub fn domain(message: impl Into<String>) -> Self {
        ToolError::Domain(message.into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("tool '{0}' is registered more than once")]
    DuplicateTool(String),
}

/// Errors raised while reading the YAML tool configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{}: top level must be a mapping", path.display())]
    NotAMapping { path: PathBuf },
}
