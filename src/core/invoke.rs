/// Event Pipeline
///
/// normalize → dispatch → format, shared by the Lambda runtime and the HTTP
/// `/invoke` route.

use serde_json::Value;
use tracing::warn;

use crate::core::dispatch::Dispatcher;
use crate::core::format::{HTTP_BAD_REQUEST, HTTP_OK, format_response};
use crate::core::normalize::{InvocationMode, normalize};
use crate::core::protocol::MCPResponse;

/// Handle one inbound event and return the outbound payload.
pub fn handle_event(dispatcher: &Dispatcher, event: Value) -> Value {
    match normalize(event) {
        Ok(request) => {
            let response = dispatcher.dispatch(&request.envelope);
            format_response(&response, request.mode, HTTP_OK)
        }
        Err(err) => {
            // Only a proxy body can fail to parse, and its id is unknowable.
            warn!(error = %err, "rejecting unparseable request body");
            let response = MCPResponse::error(Value::Null, err.to_jsonrpc_error());
            format_response(&response, InvocationMode::Proxy, HTTP_BAD_REQUEST)
        }
    }
}
