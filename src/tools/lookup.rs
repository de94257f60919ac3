/// Lookup Tools
///
/// DNS resolution, IT helpdesk answers, and application details. Each tool
/// delegates the actual query to an injected `Lookup` collaborator and turns
/// any collaborator failure into a tool-level error.

use std::sync::Arc;

use serde_json::{Map, Value, json};

use crate::core::collaborator::Lookup;
use crate::core::error::{RegistryError, ToolError};
use crate::core::protocol::MCPTool;
use crate::core::registry::ToolRegistry;

pub const DNS_LOOKUP: &str = "dns_lookup";
pub const IT_HELPDESK: &str = "it_helpdesk";
pub const APPLICATION_DETAILS: &str = "get_application_details";

/// Collaborator handles used by the lookup tools.
#[derive(Clone)]
pub struct Collaborators {
    pub resolver: Arc<dyn Lookup>,
    pub knowledge_base: Arc<dyn Lookup>,
    pub applications: Arc<dyn Lookup>,
}

fn string_schema(field: &str, description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            field: {"type": "string", "description": description}
        },
        "required": [field],
        "additionalProperties": false
    })
}

fn text_arg<'a>(args: &'a Map<String, Value>, name: &str) -> Result<&'a str, ToolError> {
    let text = args
        .get(name)
        .ok_or_else(|| ToolError::MissingArgument(name.to_string()))?
        .as_str()
        .ok_or_else(|| ToolError::InvalidType {
            name: name.to_string(),
            expected: "string".to_string(),
        })?
        .trim();
    if text.is_empty() {
        return Err(ToolError::domain(format!("Parameter '{name}' must not be empty")));
    }
    Ok(text)
}

/// Hostname syntax check: 1 to 253 characters of letters, digits, '-' and '.'.
fn validate_hostname(hostname: &str) -> Result<(), ToolError> {
    let valid = hostname.len() <= 253
        && hostname
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        && !hostname.starts_with(['-', '.']);
    if valid {
        Ok(())
    } else {
        Err(ToolError::domain(format!("Invalid hostname: {hostname}")))
    }
}

pub fn dns_lookup(resolver: &dyn Lookup, args: &Map<String, Value>) -> Result<String, ToolError> {
    let hostname = text_arg(args, "hostname")?;
    validate_hostname(hostname)?;
    let addresses = resolver.fetch(hostname)?;
    Ok(format!("DNS lookup for {hostname}: {addresses}"))
}

pub fn it_helpdesk(knowledge_base: &dyn Lookup, args: &Map<String, Value>) -> Result<String, ToolError> {
    let question = text_arg(args, "question")?;
    Ok(knowledge_base.fetch(question)?)
}

pub fn application_details(
    applications: &dyn Lookup,
    args: &Map<String, Value>,
) -> Result<String, ToolError> {
    let name = text_arg(args, "application_name")?;
    let details = applications.fetch(name)?;
    Ok(format!("Application details for {name}: {details}"))
}

/// Register the lookup tools against the given collaborators.
pub fn register(registry: &mut ToolRegistry, collaborators: &Collaborators) -> Result<(), RegistryError> {
    let resolver = Arc::clone(&collaborators.resolver);
    registry.register(
        MCPTool {
            name: DNS_LOOKUP.to_string(),
            description: "Resolve a hostname to its IP addresses".to_string(),
            input_schema: string_schema("hostname", "Hostname to resolve, e.g. example.com"),
        },
        Box::new(move |args: &Map<String, Value>| dns_lookup(resolver.as_ref(), args)),
    )?;

    let knowledge_base = Arc::clone(&collaborators.knowledge_base);
    registry.register(
        MCPTool {
            name: IT_HELPDESK.to_string(),
            description: "Answer an IT helpdesk question from the knowledge base".to_string(),
            input_schema: string_schema("question", "The user's IT question"),
        },
        Box::new(move |args: &Map<String, Value>| it_helpdesk(knowledge_base.as_ref(), args)),
    )?;

    let applications = Arc::clone(&collaborators.applications);
    registry.register(
        MCPTool {
            name: APPLICATION_DETAILS.to_string(),
            description: "Look up ownership and support details for an application".to_string(),
            input_schema: string_schema("application_name", "Name of the application"),
        },
        Box::new(move |args: &Map<String, Value>| application_details(applications.as_ref(), args)),
    )?;

    Ok(())
}
