/// JSON-RPC Dispatcher
///
/// Turns one request envelope into one response envelope. Knows nothing about
/// transports: the normalizer and formatter sit on either side of it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::{debug, error};

use crate::core::error::RpcError;
use crate::core::protocol::{JSONRPC_VERSION, MCPRequest, MCPResponse, PROTOCOL_VERSION, ToolCallResult};
use crate::core::registry::{ToolRegistry, validate_arguments};

/// Server identity reported by `initialize`.
#[derive(Clone, Debug)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    info: ServerInfo,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, info: ServerInfo) -> Self {
        Self { registry, info }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Dispatch a request envelope.
    ///
    /// Never panics: a panic in routing or in a tool handler becomes an
    /// Internal error response carrying the panic message.
    pub fn dispatch(&self, envelope: &Value) -> MCPResponse {
        // Value::get is None for non-objects, so this is safe on any input.
        let id = envelope.get("id").cloned().unwrap_or(Value::Null);

        match panic::catch_unwind(AssertUnwindSafe(|| self.route(envelope))) {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                debug!(error = %err, "request rejected");
                MCPResponse::error(id, err.to_jsonrpc_error())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(%message, "panic while dispatching request");
                MCPResponse::error(id, RpcError::Internal { message }.to_jsonrpc_error())
            }
        }
    }

    fn route(&self, envelope: &Value) -> Result<MCPResponse, RpcError> {
        if !envelope.is_object() {
            return Err(RpcError::InvalidRequest {
                message: "request must be a JSON object".to_string(),
            });
        }

        let request: MCPRequest =
            serde_json::from_value(envelope.clone()).map_err(|e| RpcError::InvalidRequest {
                message: e.to_string(),
            })?;

        if request.jsonrpc != JSONRPC_VERSION {
            return Err(RpcError::InvalidRequest {
                message: format!(
                    "expected jsonrpc version \"{JSONRPC_VERSION}\", got \"{}\"",
                    request.jsonrpc
                ),
            });
        }

        debug!(method = %request.method, id = %request.id, "dispatching");

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(),
            "ping" | "notifications/initialized" => json!({}),
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(request.params)?,
            _ => {
                return Err(RpcError::MethodNotFound {
                    method: request.method,
                });
            }
        };

        Ok(MCPResponse::success(request.id, result))
    }

    /// Handle MCP initialize method.
    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": self.info.name,
                "version": self.info.version
            }
        })
    }

    /// Handle MCP tools/list method. `params` is ignored.
    fn handle_tools_list(&self) -> Value {
        json!({ "tools": self.registry.list() })
    }

    /// Handle MCP tools/call method.
    ///
    /// Malformed params and unknown tools are protocol errors. Invalid
    /// arguments and handler failures are reported inside a successful
    /// response with `isError: true`.
    fn handle_tools_call(&self, params: Option<Value>) -> Result<Value, RpcError> {
        let params = match params {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(RpcError::InvalidParams {
                    message: "params must be an object".to_string(),
                });
            }
        };

        let tool_name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::InvalidParams {
                message: "params.name must be a string".to_string(),
            })?;

        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => {
                return Err(RpcError::InvalidParams {
                    message: "params.arguments must be an object".to_string(),
                });
            }
        };

        let (tool, handler) = self
            .registry
            .get(tool_name)
            .ok_or_else(|| RpcError::UnknownTool {
                name: tool_name.to_string(),
            })?;

        let outcome = validate_arguments(&tool.input_schema, &arguments).and_then(|()| handler(&arguments));

        let result = match outcome {
            Ok(text) => ToolCallResult::text(text),
            Err(e) => {
                debug!(tool = tool_name, error = %e, "tool reported an error");
                ToolCallResult::error_text(format!("Error: {e}"))
            }
        };

        serde_json::to_value(result).map_err(|e| RpcError::Internal {
            message: e.to_string(),
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
