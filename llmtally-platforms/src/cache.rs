//! Handler cache.
//!
//! Lazily constructs and memoizes one handler instance per platform name.
//! Handlers carry no per-invocation state, so the cache only amortizes
//! construction cost. The lock is never held across network I/O.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use llmtally_config::ConfigError;
use tracing::debug;

use crate::error::HandlerError;
use crate::handler::PlatformHandler;
use crate::registry::PlatformRegistry;

type Factory = dyn Fn(&str) -> Option<Arc<dyn PlatformHandler>> + Send + Sync;

/// Memoizes one handler per platform name across concurrent callers.
pub struct HandlerCache {
    handlers: RwLock<HashMap<String, Arc<dyn PlatformHandler>>>,
    factory: Box<Factory>,
}

impl HandlerCache {
    /// Creates a cache backed by the platform registry.
    pub fn new() -> Self {
        Self::with_factory(Box::new(|name| {
            PlatformRegistry::get(name).map(|d| (d.build)())
        }))
    }

    /// Creates a cache with a custom handler factory.
    pub fn with_factory(factory: Box<Factory>) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            factory,
        }
    }

    /// Returns the handler for `name`, constructing it on first access.
    ///
    /// At most one instance is ever constructed per name: the fast path is
    /// a shared read lock, the miss path re-checks under the write lock
    /// before constructing.
    pub fn get_or_create(&self, name: &str) -> Result<Arc<dyn PlatformHandler>, HandlerError> {
        let key = name.to_ascii_lowercase();

        {
            let map = self.handlers.read().unwrap_or_else(|e| e.into_inner());
            if let Some(handler) = map.get(&key) {
                return Ok(Arc::clone(handler));
            }
        }

        let mut map = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        // Another task may have constructed it between the two locks
        if let Some(handler) = map.get(&key) {
            return Ok(Arc::clone(handler));
        }

        let handler = (self.factory)(&key)
            .ok_or_else(|| HandlerError::Config(ConfigError::UnknownPlatform(name.to_string())))?;
        debug!(platform = %key, "handler constructed");
        map.insert(key, Arc::clone(&handler));
        Ok(handler)
    }
}

impl Default for HandlerCache {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use llmtally_config::ResolvedConfig;
    use llmtally_core::BalanceReport;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct NullHandler;

    #[async_trait]
    impl PlatformHandler for NullHandler {
        fn name(&self) -> &'static str {
            "null"
        }

        async fn fetch_balance(
            &self,
            _cfg: &ResolvedConfig,
            _client: &crate::http::HttpClient,
        ) -> Result<BalanceReport, HandlerError> {
            Ok(BalanceReport::balance_only(
                "null",
                0.0,
                "CNY",
                serde_json::Value::Null,
            ))
        }
    }

    #[test]
    fn unknown_name_is_a_config_error() {
        let cache = HandlerCache::new();
        let err = cache.get_or_create("no-such-platform").unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Config(ConfigError::UnknownPlatform(_))
        ));
    }

    #[test]
    fn repeated_access_reuses_the_instance() {
        let cache = HandlerCache::new();
        let a = cache.get_or_create("deepseek").unwrap();
        let b = cache.get_or_create("DEEPSEEK").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_first_access_constructs_once() {
        static BUILDS: AtomicUsize = AtomicUsize::new(0);

        let cache = Arc::new(HandlerCache::with_factory(Box::new(|_| {
            BUILDS.fetch_add(1, Ordering::SeqCst);
            Some(Arc::new(NullHandler) as Arc<dyn PlatformHandler>)
        })));

        let mut tasks = Vec::new();
        for _ in 0..32 {
            let cache = Arc::clone(&cache);
            tasks.push(tokio::spawn(async move {
                cache.get_or_create("null").unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
    }
}
