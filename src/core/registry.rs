/// Tool Registry
///
/// Holds the tool descriptors served by `tools/list` and the handlers run by
/// `tools/call`. Filled once at startup, read-only afterwards.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::core::error::{RegistryError, ToolError};
use crate::core::protocol::MCPTool;

/// Tool handler function type definition.
///
/// Handlers receive already-validated arguments and return the human-readable
/// summary placed in `content[0].text`. They must be Send + Sync so the HTTP
/// server can share them across worker threads.
pub type ToolHandler = Box<dyn Fn(&Map<String, Value>) -> Result<String, ToolError> + Send + Sync>;

/// Registry of available MCP tools.
///
/// Descriptors keep registration order for discovery; handlers are looked up
/// by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<MCPTool>,
    handlers: HashMap<String, ToolHandler>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A second tool with the same name is rejected.
    pub fn register(&mut self, tool: MCPTool, handler: ToolHandler) -> Result<(), RegistryError> {
        if self.handlers.contains_key(&tool.name) {
            return Err(RegistryError::DuplicateTool(tool.name));
        }
        self.handlers.insert(tool.name.clone(), handler);
        self.tools.push(tool);
        Ok(())
    }

    /// Every registered descriptor, in registration order.
    pub fn list(&self) -> &[MCPTool] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<(&MCPTool, &ToolHandler)> {
        let handler = self.handlers.get(name)?;
        let tool = self.tools.iter().find(|tool| tool.name == name)?;
        Some((tool, handler))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

/// Check `arguments` against the `required`, `properties.*.type` and
/// `additionalProperties: false` members of a tool's input schema.
///
/// Required members are checked in schema order so the reported field is
/// stable.
pub fn validate_arguments(schema: &Value, arguments: &Map<String, Value>) -> Result<(), ToolError> {
    let properties = schema.get("properties").and_then(Value::as_object);

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            if arguments.get(name).is_none_or(Value::is_null) {
                return Err(ToolError::MissingArgument(name.to_string()));
            }
        }
    }

    let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));

    for (name, value) in arguments {
        let declared = properties.and_then(|props| props.get(name));
        match declared {
            Some(property) => {
                if let Some(expected) = property.get("type").and_then(Value::as_str) {
                    if !matches_type(value, expected) {
                        return Err(ToolError::InvalidType {
                            name: name.clone(),
                            expected: expected.to_string(),
                        });
                    }
                }
            }
            None if closed => return Err(ToolError::UnexpectedArgument(name.clone())),
            None => {}
        }
    }

    Ok(())
}

fn matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "number" => value.is_number(),
        "integer" => as_integer(value).is_some(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

/// Integer view of a JSON number. Integral floats such as `5.0` count, and
/// values beyond `i64` stay integers so range checks can reject them by size.
pub fn as_integer(value: &Value) -> Option<i128> {
    if let Some(n) = value.as_i64() {
        return Some(i128::from(n));
    }
    if let Some(n) = value.as_u64() {
        return Some(i128::from(n));
    }
    let f = value.as_f64()?;
    // `as` saturates, which is enough for callers that only bound-check.
    (f.is_finite() && f.fract() == 0.0).then_some(f as i128)
}
