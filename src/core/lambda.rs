/// AWS Lambda Transport
///
/// Each invocation event is either a bare JSON-RPC envelope (direct invoke,
/// as used by Bedrock Agent Core Gateway Lambda targets) or an API Gateway
/// proxy event. Both go through the shared event pipeline.

use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;
use tokio::task;
use tracing::{debug, info};

use crate::core::dispatch::Dispatcher;
use crate::core::invoke::handle_event;

pub async fn run_lambda(dispatcher: Arc<Dispatcher>) -> Result<(), Error> {
    info!(tools = dispatcher.registry().len(), "MCP server starting (Lambda mode)");

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let dispatcher = Arc::clone(&dispatcher);
        async move {
            let (payload, context) = event.into_parts();
            debug!(request_id = %context.request_id, "invocation received");
            invoke(dispatcher, payload).await
        }
    }))
    .await
}

/// Run one event through the pipeline on the blocking pool.
async fn invoke(dispatcher: Arc<Dispatcher>, payload: Value) -> Result<Value, Error> {
    Ok(task::spawn_blocking(move || handle_event(&dispatcher, payload)).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use serde_json::json;

    use crate::core::collaborator::{Lookup, LookupError, StaticLookup};
    use crate::core::dispatch::ServerInfo;
    use crate::core::server::initialize_tools;
    use crate::tools::Collaborators;

    struct SlowDns;

    impl Lookup for SlowDns {
        fn fetch(&self, _hostname: &str) -> Result<String, LookupError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok("192.0.2.10".to_string())
        }
    }

    fn dispatcher() -> Arc<Dispatcher> {
        let collaborators = Collaborators {
            resolver: Arc::new(SlowDns),
            knowledge_base: Arc::new(StaticLookup::default()),
            applications: Arc::new(StaticLookup::default()),
        };
        Arc::new(Dispatcher::new(
            initialize_tools(&collaborators).unwrap(),
            ServerInfo {
                name: "lambda-test".to_string(),
                version: "0.0.0".to_string(),
            },
        ))
    }

    #[tokio::test]
    async fn proxy_event_is_answered_without_blocking_the_runtime() {
        let started = Instant::now();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            started.elapsed()
        });

        let event = json!({
            "body": r#"{"jsonrpc":"2.0","id":"r1","method":"tools/call","params":{"name":"dns_lookup","arguments":{"hostname":"example.com"}}}"#
        });
        let output = invoke(dispatcher(), event).await.unwrap();
        assert_eq!(output["statusCode"], 200);
        let body: Value = serde_json::from_str(output["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["id"], "r1");
        assert_eq!(
            body["result"]["content"][0]["text"],
            "DNS lookup for example.com: 192.0.2.10"
        );

        let woke_after = timer.await.unwrap();
        assert!(woke_after < Duration::from_millis(200), "timer woke after {woke_after:?}");
    }
}
