/// Tools Module
///
/// All MCP tool implementations. Each tool module exports a `register`
/// function that adds its tools to the registry during server initialization.

pub mod calculator;
pub mod lookup;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::runtime::Handle;
use tracing::info;

use crate::core::collaborator::{StaticLookup, SystemResolver, TimeBoxed};
use crate::core::error::RegistryError;
use crate::core::registry::ToolRegistry;
use crate::core::utils::{get_tool_config, tool_timeout};

pub use lookup::Collaborators;

impl Collaborators {
    /// Build the production collaborators from the tool configuration.
    ///
    /// The resolver does network I/O and is time-boxed on `runtime` with the
    /// tool's `timeout_ms`. The keyword tables live in memory and are used as-is.
    pub fn from_config(config: &HashMap<String, Value>, runtime: Handle) -> Self {
        let dns = get_tool_config(config, lookup::DNS_LOOKUP);
        let helpdesk = get_tool_config(config, lookup::IT_HELPDESK);
        let apps = get_tool_config(config, lookup::APPLICATION_DETAILS);
        let resolver_timeout = tool_timeout(&dns);

        let knowledge_base = StaticLookup::from_value(helpdesk.get("entries"));
        let applications = StaticLookup::from_value(apps.get("applications"));
        info!(
            helpdesk_entries = knowledge_base.len(),
            applications = applications.len(),
            resolver_timeout_ms = resolver_timeout.as_millis() as u64,
            "lookup tables loaded"
        );

        Self {
            resolver: Arc::new(TimeBoxed::new(Arc::new(SystemResolver), resolver_timeout, runtime)),
            knowledge_base: Arc::new(knowledge_base),
            applications: Arc::new(applications),
        }
    }
}

/// Register every tool. Fails if two tools share a name.
pub fn register_all(registry: &mut ToolRegistry, collaborators: &Collaborators) -> Result<(), RegistryError> {
    calculator::register(registry)?;
    lookup::register(registry, collaborators)?;
    Ok(())
}
