//! Time-bounded memoization of tool results
//!
//! A [`ToolCache`] is shared by every tool of a crew run. Identical calls
//! (same tool, same canonical input) within the TTL return the stored result
//! without running the tool again. Failed calls are never stored.

use crate::Tool;
use agent_core::Result;
use async_trait::async_trait;
use cached::{Cached, TimedCache};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Cache key: tool name plus the canonical JSON text of its input
///
/// `serde_json` keeps object keys sorted, so `{"a":1,"b":2}` and
/// `{"b":2,"a":1}` produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    tool: String,
    input: String,
}

impl CacheKey {
    fn new(tool: &str, input: &Value) -> Self {
        Self {
            tool: tool.to_string(),
            input: input.to_string(),
        }
    }
}

/// Shared, thread-safe store of tool results
#[derive(Clone)]
pub struct ToolCache {
    inner: Arc<RwLock<TimedCache<CacheKey, Value>>>,
}

impl ToolCache {
    /// Create a cache whose entries expire after `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Look up a stored result
    pub async fn get(&self, tool: &str, input: &Value) -> Option<Value> {
        let mut cache = self.inner.write().await;
        cache.cache_get(&CacheKey::new(tool, input)).cloned()
    }

    /// Store a result
    pub async fn insert(&self, tool: &str, input: &Value, output: Value) {
        let mut cache = self.inner.write().await;
        let _ = cache.cache_set(CacheKey::new(tool, input), output);
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        let cache = self.inner.read().await;
        cache.cache_size()
    }

    /// Check if the cache holds no entries
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every entry
    pub async fn clear(&self) {
        let mut cache = self.inner.write().await;
        cache.cache_clear();
    }

    /// Wrap a tool so its results go through this cache
    pub fn wrap(&self, tool: Arc<dyn Tool>) -> Arc<dyn Tool> {
        Arc::new(CachingTool::new(tool, self.clone()))
    }
}

impl std::fmt::Debug for ToolCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCache").finish_non_exhaustive()
    }
}

/// A tool decorated with a [`ToolCache`]
pub struct CachingTool {
    inner: Arc<dyn Tool>,
    cache: ToolCache,
}

impl CachingTool {
    /// Wrap `inner` with `cache`
    pub fn new(inner: Arc<dyn Tool>, cache: ToolCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl Tool for CachingTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let name = self.inner.name();

        if let Some(hit) = self.cache.get(name, &params).await {
            tracing::debug!(tool = name, "Tool cache hit");
            return Ok(hit);
        }

        let output = self.inner.execute(params.clone()).await?;
        self.cache.insert(name, &params, output.clone()).await;
        Ok(output)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn input_schema(&self) -> Value {
        self.inner.input_schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Tool for Counting {
        async fn execute(&self, params: Value) -> Result<Value> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Err(agent_core::Error::tool("counting", "boom"));
            }
            Ok(json!({ "call": n, "params": params }))
        }

        fn name(&self) -> &str {
            "counting"
        }

        fn description(&self) -> &str {
            "Counts its calls"
        }

        fn input_schema(&self) -> Value {
            json!({ "type": "object" })
        }
    }

    fn counting(fail: bool) -> Arc<Counting> {
        Arc::new(Counting {
            calls: AtomicUsize::new(0),
            fail,
        })
    }

    #[tokio::test]
    async fn test_identical_calls_hit_cache() {
        let inner = counting(false);
        let cache = ToolCache::new(Duration::from_secs(60));
        let tool = cache.wrap(inner.clone());

        let first = tool.execute(json!({ "a": 1, "b": 2 })).await.unwrap();
        let second = tool.execute(json!({ "b": 2, "a": 1 })).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 1);
        assert_eq!(tool.name(), "counting");
    }

    #[tokio::test]
    async fn test_different_input_misses() {
        let inner = counting(false);
        let cache = ToolCache::new(Duration::from_secs(60));
        let tool = cache.wrap(inner.clone());

        tool.execute(json!({ "ticker": "AAPL" })).await.unwrap();
        tool.execute(json!({ "ticker": "MSFT" })).await.unwrap();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let inner = counting(true);
        let cache = ToolCache::new(Duration::from_secs(60));
        let tool = cache.wrap(inner.clone());

        assert!(tool.execute(json!({})).await.is_err());
        assert!(tool.execute(json!({})).await.is_err());

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty().await);
    }
}
