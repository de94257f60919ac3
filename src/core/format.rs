/// Response Formatter
///
/// Wraps a response envelope for the calling convention it arrived in.
///
/// Status policy in proxy mode: every well-formed JSON-RPC response, success
/// or error, goes out as HTTP 200. Clients read the JSON-RPC `error` member.
/// Only transport failures (a body that is not JSON) use 400.

use serde_json::{Value, json};

use crate::core::normalize::InvocationMode;
use crate::core::protocol::MCPResponse;

pub const HTTP_OK: u16 = 200;
pub const HTTP_BAD_REQUEST: u16 = 400;

/// Headers attached to every proxy-mode reply.
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Headers", "Content-Type,Authorization"),
    ("Access-Control-Allow-Methods", "OPTIONS,POST"),
];

/// Produce the outbound payload for `response`.
pub fn format_response(response: &MCPResponse, mode: InvocationMode, status: u16) -> Value {
    match mode {
        InvocationMode::Direct => json!(response),
        InvocationMode::Proxy => {
            let mut headers = serde_json::Map::new();
            headers.insert("Content-Type".to_string(), json!("application/json"));
            for (name, value) in CORS_HEADERS {
                headers.insert(name.to_string(), json!(value));
            }

            let body = serde_json::to_string(response).unwrap_or_else(|_| {
                r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error"}}"#
                    .to_string()
            });

            json!({
                "statusCode": status,
                "headers": headers,
                "body": body
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::protocol::MCPError;

    fn sample() -> MCPResponse {
        MCPResponse::success(json!(1), json!({"tools": []}))
    }

    #[test]
    fn direct_mode_returns_envelope_unchanged() {
        let formatted = format_response(&sample(), InvocationMode::Direct, HTTP_OK);
        assert_eq!(formatted, json!({"jsonrpc": "2.0", "id": 1, "result": {"tools": []}}));
    }

    #[test]
    fn proxy_mode_wraps_body_as_string() {
        let formatted = format_response(&sample(), InvocationMode::Proxy, HTTP_OK);
        assert_eq!(formatted["statusCode"], 200);
        assert_eq!(formatted["headers"]["Content-Type"], "application/json");
        assert_eq!(formatted["headers"]["Access-Control-Allow-Origin"], "*");
        let body: Value = serde_json::from_str(formatted["body"].as_str().unwrap()).unwrap();
        assert_eq!(body, json!(sample()));
    }

    #[test]
    fn proxy_mode_keeps_requested_status_for_error_envelopes() {
        let response = MCPResponse::error(
            Value::Null,
            MCPError {
                code: -32601,
                message: "Method not found: x".to_string(),
                data: None,
            },
        );
        let formatted = format_response(&response, InvocationMode::Proxy, HTTP_OK);
        assert_eq!(formatted["statusCode"], 200);
    }
}
