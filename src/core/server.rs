/// MCP Server Transports
///
/// HTTP (Actix Web) and STDIO front ends. Both feed requests into the same
/// `Dispatcher`; neither adds protocol logic of its own.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use actix_web::{
    App, HttpResponse, HttpServer,
    error::BlockingError,
    middleware::{Compress, DefaultHeaders, Logger},
    web,
};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::task;
use tracing::{debug, error, info, warn};

use crate::core::dispatch::Dispatcher;
use crate::core::error::{RegistryError, RpcError};
use crate::core::invoke::handle_event;
use crate::core::protocol::MCPResponse;
use crate::core::registry::ToolRegistry;
use crate::tools::{self, Collaborators};

/// Build the tool registry with every tool registered.
///
/// Fails when two tools claim the same name; callers treat that as fatal.
pub fn initialize_tools(collaborators: &Collaborators) -> Result<Arc<ToolRegistry>, RegistryError> {
    let mut registry = ToolRegistry::new();
    tools::register_all(&mut registry, collaborators)?;
    info!(tools = registry.len(), "tool registry initialized");
    Ok(Arc::new(registry))
}

/// Health check endpoint handler.
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "mcp-tool-server"
    }))
}

/// Returns the number of MCP requests processed since server start.
async fn metrics_handler(counter: web::Data<AtomicU64>) -> HttpResponse {
    let count = counter.load(Ordering::Relaxed);
    HttpResponse::Ok().json(serde_json::json!({
        "requests_total": count,
        "status": "ok"
    }))
}

fn parse_failure(err: serde_json::Error) -> HttpResponse {
    warn!(error = %err, "rejecting unparseable HTTP body");
    let response = MCPResponse::error(Value::Null, RpcError::Parse { source: err }.to_jsonrpc_error());
    HttpResponse::BadRequest().json(response)
}

fn blocking_failure(err: BlockingError) -> HttpResponse {
    error!(error = %err, "blocking pool rejected request");
    let response = MCPResponse::error(
        Value::Null,
        RpcError::Internal {
            message: err.to_string(),
        }
        .to_jsonrpc_error(),
    );
    HttpResponse::InternalServerError().json(response)
}

/// MCP JSON-RPC handler: the HTTP body is the request envelope.
///
/// Dispatch runs on the blocking pool since tool handlers may wait on a
/// collaborator.
async fn mcp_handler(
    dispatcher: web::Data<Dispatcher>,
    counter: web::Data<AtomicU64>,
    body: web::Bytes,
) -> HttpResponse {
    counter.fetch_add(1, Ordering::Relaxed);
    let envelope = match serde_json::from_slice::<Value>(&body) {
        Ok(envelope) => envelope,
        Err(e) => return parse_failure(e),
    };

    let dispatcher = dispatcher.into_inner();
    match web::block(move || dispatcher.dispatch(&envelope)).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => blocking_failure(e),
    }
}

/// Lambda-style invocation handler: the HTTP body is a raw function event,
/// either a bare envelope or a proxy event carrying one in `body`. The reply
/// is exactly what the Lambda transport would return.
async fn invoke_handler(
    dispatcher: web::Data<Dispatcher>,
    counter: web::Data<AtomicU64>,
    body: web::Bytes,
) -> HttpResponse {
    counter.fetch_add(1, Ordering::Relaxed);
    let event = match serde_json::from_slice::<Value>(&body) {
        Ok(event) => event,
        Err(e) => return parse_failure(e),
    };

    let dispatcher = dispatcher.into_inner();
    match web::block(move || handle_event(&dispatcher, event)).await {
        Ok(output) => HttpResponse::Ok().json(output),
        Err(e) => blocking_failure(e),
    }
}

/// Route table, shared by the server and the tests.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics_handler))
        .route("/mcp", web::post().to(mcp_handler))
        .route("/invoke", web::post().to(invoke_handler))
        .route("/", web::post().to(mcp_handler))
        .route("/", web::get().to(health));
}

/// Run the MCP server in HTTP mode.
///
/// The server is configured with:
/// - Worker threads: from settings (CPU count, max 16, by default)
/// - Max connections: 10,000 concurrent connections
/// - Connection rate limit: 1,000 connections per second
/// - Keep-alive / request timeout: 30 seconds
/// - Shutdown timeout: 10 seconds
pub async fn run_server_http(
    dispatcher: Arc<Dispatcher>,
    host: String,
    port: u16,
    workers: usize,
) -> std::io::Result<()> {
    let bind_addr = format!("{}:{}", host, port);

    let dispatcher = web::Data::from(dispatcher);
    let request_count = web::Data::new(AtomicU64::new(0));

    info!(
        bind = %bind_addr,
        workers,
        tools = dispatcher.registry().len(),
        "MCP server starting (HTTP mode)"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(dispatcher.clone())
            .app_data(request_count.clone())
            // Enable compression for JSON responses (gzip/brotli)
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY")),
            )
            // %r = request line, %s = status, %Dms = duration in milliseconds
            .wrap(Logger::new("%r %s %Dms"))
            .configure(routes)
    })
    .workers(workers)
    .max_connections(10000)
    .max_connection_rate(1000)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await
}

/// Run the MCP server in STDIO mode on the process's stdin/stdout.
pub async fn run_server_stdio(dispatcher: Arc<Dispatcher>) -> std::io::Result<()> {
    info!(tools = dispatcher.registry().len(), "MCP server starting (STDIO mode)");
    serve_lines(dispatcher, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Line-delimited JSON-RPC loop.
///
/// One request per line, one response per line. Blank lines are skipped,
/// notifications get no reply, and unparseable lines get a Parse error with
/// a null id. Each request is dispatched on the blocking pool, so a slow
/// tool never holds up the runtime. Returns when the input reaches EOF.
pub async fn serve_lines<R, W>(dispatcher: Arc<Dispatcher>, input: R, output: W) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::with_capacity(8192, input).lines();
    let mut output = BufWriter::with_capacity(8192, output);

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(&line) {
            Ok(envelope) => {
                if is_notification(&envelope) {
                    debug!(method = ?envelope.get("method"), "notification received");
                    continue;
                }
                let dispatcher = Arc::clone(&dispatcher);
                task::spawn_blocking(move || dispatcher.dispatch(&envelope))
                    .await
                    .map_err(std::io::Error::other)?
            }
            Err(e) => {
                warn!(error = %e, "parse error on stdin");
                MCPResponse::error(Value::Null, RpcError::Parse { source: e }.to_jsonrpc_error())
            }
        };

        let response_json = serde_json::to_string(&response).map_err(std::io::Error::other)?;
        output.write_all(response_json.as_bytes()).await?;
        output.write_all(b"\n").await?;
        // Flush after each response so the client is never left waiting.
        output.flush().await?;
    }

    Ok(())
}

/// A notification carries no `id` and a `notifications/` method.
fn is_notification(envelope: &Value) -> bool {
    envelope.get("id").is_none()
        && envelope
            .get("method")
            .and_then(Value::as_str)
            .is_some_and(|method| method.starts_with("notifications/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collaborator::{Lookup, LookupError, StaticLookup};
    use crate::core::dispatch::ServerInfo;
    use actix_web::{http::StatusCode, test};
    use serde_json::json;
    use std::time::Instant;

    struct NoDns;

    impl Lookup for NoDns {
        fn fetch(&self, query: &str) -> Result<String, LookupError> {
            Err(LookupError::NotFound(query.to_string()))
        }
    }

    struct SlowDns(Duration);

    impl Lookup for SlowDns {
        fn fetch(&self, _query: &str) -> Result<String, LookupError> {
            std::thread::sleep(self.0);
            Ok("10.0.0.1".to_string())
        }
    }

    fn test_dispatcher() -> Arc<Dispatcher> {
        dispatcher_with_resolver(Arc::new(NoDns))
    }

    fn dispatcher_with_resolver(resolver: Arc<dyn Lookup>) -> Arc<Dispatcher> {
        let collaborators = Collaborators {
            resolver,
            knowledge_base: Arc::new(StaticLookup::default()),
            applications: Arc::new(StaticLookup::default()),
        };
        let registry = initialize_tools(&collaborators).unwrap();
        Arc::new(Dispatcher::new(
            registry,
            ServerInfo {
                name: "test".to_string(),
                version: "0.0.0".to_string(),
            },
        ))
    }

    async fn run_stdio(input: &str) -> Vec<Value> {
        let dispatcher = test_dispatcher();
        let mut output = Vec::new();
        serve_lines(dispatcher, input.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn stdio_answers_each_request_line() {
        let responses = run_stdio(concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"add","arguments":{"a":5,"b":3}}}"#,
            "\n",
        ))
        .await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[1]["result"]["content"][0]["text"], "Addition: 5 + 3 = 8");
    }

    #[tokio::test]
    async fn stdio_reports_parse_errors_with_null_id() {
        let responses = run_stdio("{not json\n").await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[0]["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn stdio_answers_tools_list_without_id() {
        let responses = run_stdio("{\"jsonrpc\":\"2.0\",\"method\":\"tools/list\"}\n").await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], Value::Null);
        assert!(responses[0]["result"]["tools"].is_array());
    }

    #[tokio::test]
    async fn slow_lookup_does_not_stall_other_tasks() {
        let dispatcher = dispatcher_with_resolver(Arc::new(SlowDns(Duration::from_millis(300))));
        let started = Instant::now();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            started.elapsed()
        });

        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"dns_lookup","arguments":{"hostname":"example.com"}}}"#,
            "\n",
        );
        let mut output = Vec::new();
        serve_lines(dispatcher, input.as_bytes(), &mut output).await.unwrap();

        let woke_after = timer.await.unwrap();
        assert!(woke_after < Duration::from_millis(200), "timer woke after {woke_after:?}");

        let response: Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(
            response["result"]["content"][0]["text"],
            "DNS lookup for example.com: 10.0.0.1"
        );
    }

    #[actix_rt::test]
    async fn http_dispatch_runs_off_the_worker() {
        let counter = web::Data::new(AtomicU64::new(0));
        let dispatcher = web::Data::from(dispatcher_with_resolver(Arc::new(SlowDns(Duration::from_millis(300)))));
        let app = test::init_service(App::new().app_data(dispatcher).app_data(counter).configure(routes)).await;

        let started = Instant::now();
        let timer = actix_rt::spawn(async move {
            actix_rt::time::sleep(Duration::from_millis(10)).await;
            started.elapsed()
        });

        let req = test::TestRequest::post()
            .uri("/mcp")
            .set_payload(r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"dns_lookup","arguments":{"hostname":"example.com"}}}"#)
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["result"]["isError"], false);

        let woke_after = timer.await.unwrap();
        assert!(woke_after < Duration::from_millis(200), "timer woke after {woke_after:?}");
    }

    fn app_data() -> (web::Data<Dispatcher>, web::Data<AtomicU64>) {
        (web::Data::from(test_dispatcher()), web::Data::new(AtomicU64::new(0)))
    }

    #[actix_rt::test]
    async fn http_mcp_route_dispatches_envelopes() {
        let (dispatcher, counter) = app_data();
        let app = test::init_service(
            App::new()
                .app_data(dispatcher)
                .app_data(counter.clone())
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/mcp")
            .set_payload(r#"{"jsonrpc":"2.0","id":"x","method":"tools/call","params":{"name":"divide","arguments":{"a":1,"b":0}}}"#)
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["id"], "x");
        assert_eq!(resp["result"]["isError"], true);
        assert_eq!(
            resp["result"]["content"][0]["text"],
            "Error: Division by zero is undefined"
        );

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let metrics: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(metrics["requests_total"], 1);
    }

    #[actix_rt::test]
    async fn http_jsonrpc_errors_still_return_200() {
        let (dispatcher, counter) = app_data();
        let app = test::init_service(App::new().app_data(dispatcher).app_data(counter).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/mcp")
            .set_payload(r#"{"jsonrpc":"1.0","id":1,"method":"tools/list"}"#)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], -32600);
    }

    #[actix_rt::test]
    async fn http_unparseable_body_is_400() {
        let (dispatcher, counter) = app_data();
        let app = test::init_service(App::new().app_data(dispatcher).app_data(counter).configure(routes)).await;

        let req = test::TestRequest::post().uri("/mcp").set_payload("{oops").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], -32700);
        assert_eq!(body["id"], Value::Null);
    }

    #[actix_rt::test]
    async fn http_invoke_route_wraps_proxy_events() {
        let (dispatcher, counter) = app_data();
        let app = test::init_service(App::new().app_data(dispatcher).app_data(counter).configure(routes)).await;

        let event = json!({
            "httpMethod": "POST",
            "body": r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"multiply","arguments":{"a":6,"b":7}}}"#
        });
        let req = test::TestRequest::post()
            .uri("/invoke")
            .set_payload(event.to_string())
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["statusCode"], 200);
        let body: Value = serde_json::from_str(resp["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["id"], 7);
        assert_eq!(body["result"]["content"][0]["text"], "Multiplication: 6 * 7 = 42");
    }

    #[actix_rt::test]
    async fn health_routes_respond() {
        let (dispatcher, counter) = app_data();
        let app = test::init_service(App::new().app_data(dispatcher).app_data(counter).configure(routes)).await;
        for uri in ["/health", "/"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["status"], "ok");
        }
    }
}
