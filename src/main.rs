/// MCP Tool Server Entry Point
///
/// Reads settings from the environment, builds the tool registry once, and
/// starts the transport selected by MCP_TRANSPORT_MODE ("lambda", "stdio",
/// "http" or "both"). See `core::utils::ServerSettings` for every variable.

mod core;
mod tools;

use std::sync::Arc;

use tracing::error;

use crate::core::dispatch::{Dispatcher, ServerInfo};
use crate::core::{lambda, server, utils};
use crate::tools::Collaborators;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    utils::init_tracing();

    let settings = utils::ServerSettings::from_env();
    let config = utils::load_config(&settings.config_path);
    let collaborators = Collaborators::from_config(&config, tokio::runtime::Handle::current());

    // A name collision means the tool table is broken; refuse to start.
    let registry = match server::initialize_tools(&collaborators) {
        Ok(registry) => registry,
        Err(e) => {
            error!(error = %e, "invalid tool registry");
            std::process::exit(1);
        }
    };

    let dispatcher = Arc::new(Dispatcher::new(
        registry,
        ServerInfo {
            name: settings.name.clone(),
            version: settings.version.clone(),
        },
    ));

    match settings.transport.as_str() {
        "lambda" => lambda::run_lambda(dispatcher)
            .await
            .map_err(|e| std::io::Error::other(e.to_string())),
        "stdio" => server::run_server_stdio(dispatcher).await,
        "http" => {
            server::run_server_http(dispatcher, settings.host, settings.port, settings.workers).await
        }
        "both" => {
            // STDIO runs in the background so MCP Inspector can attach while
            // the HTTP endpoints stay available.
            let stdio_dispatcher = Arc::clone(&dispatcher);
            let stdio_handle = tokio::spawn(async move {
                if let Err(e) = server::run_server_stdio(stdio_dispatcher).await {
                    error!(error = %e, "STDIO server error");
                }
            });

            let http_result =
                server::run_server_http(dispatcher, settings.host, settings.port, settings.workers).await;

            stdio_handle.abort();
            http_result
        }
        other => {
            error!(
                transport = other,
                "invalid transport mode, expected 'lambda', 'stdio', 'http' or 'both'"
            );
            std::process::exit(1);
        }
    }
}
