/// Utility Functions for Configuration, Environment and Logging
///
/// Process settings come from environment variables. Tool settings come from
/// a YAML file organized hierarchically with a `tools` section keyed by tool
/// name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::core::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "kmcp.yaml";
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_millis(3000);
const MIN_WORKERS: usize = 1;
const MAX_WORKERS: usize = 16;

/// Server settings read from the environment.
///
/// Environment Variables:
/// - SERVER_NAME: Name of the server (default: "mcp-tool-server")
/// - SERVER_VERSION: Version string (default: "0.1.0")
/// - MCP_TRANSPORT_MODE: "lambda", "stdio", "http", or "both" (default: "both")
/// - HOST: Bind address for HTTP mode (default: "0.0.0.0")
/// - PORT: Port number for HTTP mode (default: 3000)
/// - WORKER_THREADS: HTTP worker count (default: CPU count; always 1 to 16)
/// - MCP_CONFIG: Path to the YAML tool configuration (default: "kmcp.yaml")
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub name: String,
    pub version: String,
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub config_path: PathBuf,
}

impl ServerSettings {
    pub fn from_env() -> Self {
        Self {
            name: get_env_var("SERVER_NAME", "mcp-tool-server"),
            version: get_env_var("SERVER_VERSION", "0.1.0"),
            transport: get_env_var("MCP_TRANSPORT_MODE", "both"),
            host: get_env_var("HOST", "0.0.0.0"),
            port: get_env_var("PORT", "3000").parse::<u16>().unwrap_or(3000),
            workers: worker_count(std::env::var("WORKER_THREADS").ok().as_deref()),
            config_path: PathBuf::from(get_env_var("MCP_CONFIG", DEFAULT_CONFIG_PATH)),
        }
    }
}

/// HTTP worker count: an explicit value or the CPU count, always within 1..=16.
fn worker_count(configured: Option<&str>) -> usize {
    configured
        .and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or_else(num_cpus::get)
        .clamp(MIN_WORKERS, MAX_WORKERS)
}

/// Install the global tracing subscriber.
///
/// Logs go to stderr so stdout stays reserved for the stdio JSON-RPC stream.
/// `RUST_LOG` sets the filter; `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = if get_env_var("LOG_FORMAT", "text") == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Load configuration from a YAML file.
///
/// Expected structure:
/// ```yaml
/// tools:
///   dns_lookup:
///     timeout_ms: 2000
///   it_helpdesk:
///     entries:
///       password: "Reset it from the self-service portal."
/// ```
pub fn load_config_from(path: &Path) -> Result<HashMap<String, Value>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let value: Value = serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        Value::Null => Ok(HashMap::new()),
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(ConfigError::NotAMapping {
            path: path.to_path_buf(),
        }),
    }
}

/// Load configuration, falling back to an empty configuration.
///
/// A missing file is normal (all tools have defaults); any other failure is
/// logged and ignored.
pub fn load_config(path: &Path) -> HashMap<String, Value> {
    match load_config_from(path) {
        Ok(config) => {
            info!(path = %path.display(), "loaded tool configuration");
            config
        }
        Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no tool configuration file, using defaults");
            HashMap::new()
        }
        Err(e) => {
            warn!(error = %e, "ignoring unusable tool configuration");
            HashMap::new()
        }
    }
}

/// Get tool-specific configuration from the loaded configuration.
///
/// Navigates `config -> tools -> tool_name` and returns that object, or an
/// empty map if the tool has no section.
pub fn get_tool_config(config: &HashMap<String, Value>, tool_name: &str) -> HashMap<String, Value> {
    config
        .get("tools")
        .and_then(|tools| tools.get(tool_name))
        .and_then(Value::as_object)
        .map(|tool_config| {
            tool_config
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default()
}

/// `timeout_ms` from a tool section, or the default lookup timeout.
pub fn tool_timeout(tool_config: &HashMap<String, Value>) -> Duration {
    tool_config
        .get("timeout_ms")
        .and_then(Value::as_u64)
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_LOOKUP_TIMEOUT)
}

/// Get environment variable value with a default fallback.
pub fn get_env_var(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_tool_sections_from_yaml() {
        let file = write_config(
            "tools:\n  dns_lookup:\n    timeout_ms: 250\n  it_helpdesk:\n    entries:\n      vpn: Use the VPN client.\n",
        );
        let config = load_config_from(file.path()).unwrap();

        let dns = get_tool_config(&config, "dns_lookup");
        assert_eq!(dns.get("timeout_ms"), Some(&json!(250)));
        assert_eq!(tool_timeout(&dns), Duration::from_millis(250));

        let helpdesk = get_tool_config(&config, "it_helpdesk");
        assert_eq!(helpdesk["entries"]["vpn"], "Use the VPN client.");
    }

    #[test]
    fn empty_file_is_empty_config() {
        let file = write_config("");
        assert!(load_config_from(file.path()).unwrap().is_empty());
    }

    #[test]
    fn non_mapping_top_level_is_rejected() {
        let file = write_config("- just\n- a list\n");
        assert!(matches!(
            load_config_from(file.path()),
            Err(ConfigError::NotAMapping { .. })
        ));
    }

    #[test]
    fn invalid_yaml_is_reported() {
        let file = write_config("tools: [unclosed\n");
        assert!(matches!(load_config_from(file.path()), Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn worker_count_stays_in_range() {
        assert_eq!(worker_count(Some("0")), 1);
        assert_eq!(worker_count(Some("64")), 16);
        assert_eq!(worker_count(Some(" 4 ")), 4);
        let default = worker_count(None);
        assert!((1..=16).contains(&default));
        assert_eq!(worker_count(Some("many")), default);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config(Path::new("/nonexistent/kmcp.yaml"));
        assert!(config.is_empty());
        assert!(get_tool_config(&config, "dns_lookup").is_empty());
        assert_eq!(tool_timeout(&HashMap::new()), DEFAULT_LOOKUP_TIMEOUT);
    }
}
