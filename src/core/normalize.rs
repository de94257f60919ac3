/// Request Normalizer
///
/// Accepts either a bare JSON-RPC envelope (direct invocation) or an HTTP
/// gateway proxy event whose `body` holds the envelope, and records which
/// calling convention was used so the reply can be wrapped the same way.

use serde_json::Value;

use crate::core::error::RpcError;

/// Calling convention of the inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMode {
    /// Event is the envelope; the response goes back unchanged.
    Direct,
    /// Envelope arrived in `body`; the response is wrapped as an HTTP reply.
    Proxy,
}

#[derive(Debug)]
pub struct NormalizedRequest {
    pub envelope: Value,
    pub mode: InvocationMode,
}

/// Extract the request envelope from a raw inbound event.
///
/// A string `body` is decoded as JSON; any other `body` value is taken as the
/// envelope itself. Fails only when a string body is not valid JSON.
pub fn normalize(event: Value) -> Result<NormalizedRequest, RpcError> {
    let mut fields = match event {
        Value::Object(fields) => fields,
        other => {
            return Ok(NormalizedRequest {
                envelope: other,
                mode: InvocationMode::Direct,
            });
        }
    };

    let Some(body) = fields.remove("body") else {
        return Ok(NormalizedRequest {
            envelope: Value::Object(fields),
            mode: InvocationMode::Direct,
        });
    };

    let envelope = match body {
        Value::String(text) => {
            serde_json::from_str(&text).map_err(|source| RpcError::Parse { source })?
        }
        other => other,
    };

    Ok(NormalizedRequest {
        envelope,
        mode: InvocationMode::Proxy,
    })
}
