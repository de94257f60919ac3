/// External Lookup Collaborators
///
/// Tools that need real I/O (DNS resolution, knowledge-base retrieval) receive
/// a `Lookup` handle at registration time instead of reaching for globals.
/// Handles are built once at startup and shared by every invocation.

use std::collections::BTreeMap;
use std::net::{IpAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::{task, time};

/// Failure modes of a collaborator call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LookupError {
    #[error("No result found for '{0}'")]
    NotFound(String),

    #[error("Lookup timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Lookup failed: {0}")]
    Failed(String),
}

/// A single synchronous query against an external service.
pub trait Lookup: Send + Sync {
    fn fetch(&self, query: &str) -> Result<String, LookupError>;
}

/// Runs the wrapped lookup on the runtime's blocking pool and gives up after
/// `timeout`.
///
/// Must be called off the async executor (from `spawn_blocking` or
/// `web::block`). An abandoned lookup is left to finish on its own; its
/// result is dropped.
pub struct TimeBoxed {
    inner: Arc<dyn Lookup>,
    timeout: Duration,
    runtime: Handle,
}

impl TimeBoxed {
    pub fn new(inner: Arc<dyn Lookup>, timeout: Duration, runtime: Handle) -> Self {
        Self {
            inner,
            timeout,
            runtime,
        }
    }
}

impl Lookup for TimeBoxed {
    fn fetch(&self, query: &str) -> Result<String, LookupError> {
        let inner = Arc::clone(&self.inner);
        let query = query.to_string();

        self.runtime.block_on(async {
            let lookup = task::spawn_blocking(move || inner.fetch(&query));
            match time::timeout(self.timeout, lookup).await {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => Err(LookupError::Failed(e.to_string())),
                Err(_) => Err(LookupError::Timeout(self.timeout)),
            }
        })
    }
}

/// Resolves hostnames with the operating system resolver.
pub struct SystemResolver;

impl Lookup for SystemResolver {
    fn fetch(&self, hostname: &str) -> Result<String, LookupError> {
        let addrs = (hostname, 0)
            .to_socket_addrs()
            .map_err(|e| LookupError::Failed(e.to_string()))?;

        let mut ips: Vec<IpAddr> = addrs.map(|addr| addr.ip()).collect();
        ips.sort();
        ips.dedup();

        if ips.is_empty() {
            return Err(LookupError::NotFound(hostname.to_string()));
        }
        Ok(ips
            .iter()
            .map(IpAddr::to_string)
            .collect::<Vec<_>>()
            .join(", "))
    }
}

/// Keyword table answering queries from configuration data.
///
/// Keys are matched case-insensitively: an exact key wins, otherwise the first
/// key (in sorted order) contained in the query.
#[derive(Debug, Default)]
pub struct StaticLookup {
    entries: BTreeMap<String, String>,
}

impl StaticLookup {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into().trim().to_lowercase(), v.into()))
                .filter(|(k, _)| !k.is_empty())
                .collect(),
        }
    }

    /// Build from a JSON object of `key: answer` strings. Non-string answers
    /// are skipped.
    pub fn from_value(value: Option<&Value>) -> Self {
        let entries = value
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|answer| (k.clone(), answer.to_string())))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Self::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Lookup for StaticLookup {
    fn fetch(&self, query: &str) -> Result<String, LookupError> {
        let needle = query.trim().to_lowercase();
        if let Some(answer) = self.entries.get(&needle) {
            return Ok(answer.clone());
        }
        self.entries
            .iter()
            .find(|(key, _)| needle.contains(key.as_str()))
            .map(|(_, answer)| answer.clone())
            .ok_or_else(|| LookupError::NotFound(query.trim().to_string()))
    }
}
