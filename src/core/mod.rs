/// Core Server Framework Module
///
/// - protocol.rs: JSON-RPC 2.0 / MCP wire types
/// - error.rs: protocol, tool, registry and config errors
/// - registry.rs: tool registry and argument validation
/// - dispatch.rs: JSON-RPC method routing
/// - normalize.rs / format.rs: direct vs. proxy calling conventions
/// - invoke.rs: normalize → dispatch → format pipeline
/// - collaborator.rs: injected lookup services for I/O-backed tools
/// - server.rs / lambda.rs: HTTP, STDIO and Lambda transports
/// - utils.rs: configuration, environment and logging

pub mod collaborator;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod invoke;
pub mod lambda;
pub mod normalize;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod utils;
