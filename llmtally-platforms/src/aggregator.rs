//! Aggregation orchestrator.
//!
//! Fans out one query task per selected platform under a bounded worker
//! pool, isolates every failure into its own outcome row, and returns the
//! rows in input order regardless of completion order.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use llmtally_config::{ConfigResolver, ResolvedConfig};
use llmtally_core::{BalanceReport, FailureKind, FailureSummary, PlatformOutcome, TokenPackage};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::cache::HandlerCache;
use crate::error::HandlerError;
use crate::handler::PlatformHandler;
use crate::http::HttpClient;
use crate::registry::PlatformRegistry;

/// Worker pool size. Small enough to stay under per-backend rate limits,
/// large enough that a full run is bounded by the slowest backend, not the
/// sum of them.
pub const DEFAULT_CONCURRENCY: usize = 5;

type BoxFut<T> = Pin<Box<dyn Future<Output = Result<T, HandlerError>> + Send>>;
type QueryOp<T> = fn(Arc<dyn PlatformHandler>, ResolvedConfig, HttpClient) -> BoxFut<T>;

/// Orchestrates concurrent platform queries.
pub struct Aggregator {
    resolver: Arc<ConfigResolver>,
    cache: Arc<HandlerCache>,
    client: HttpClient,
    concurrency: usize,
}

impl Aggregator {
    /// Creates an aggregator over the given resolver.
    pub fn new(resolver: ConfigResolver) -> Result<Self, HandlerError> {
        Ok(Self {
            resolver: Arc::new(resolver),
            cache: Arc::new(HandlerCache::new()),
            client: HttpClient::new()?,
            concurrency: DEFAULT_CONCURRENCY,
        })
    }

    /// Overrides the worker pool size.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    // ------------------------------------------------------------------
    // Platform selection
    // ------------------------------------------------------------------

    /// Platforms to query for balances: the explicit selection as given, or
    /// every registered platform whose resolved config enables it.
    pub fn select_balance_platforms(
        &self,
        requested: Option<&[String]>,
    ) -> Result<Vec<String>, HandlerError> {
        match requested {
            Some(names) => Ok(names.iter().map(|n| n.to_ascii_lowercase()).collect()),
            None => self.enabled_platforms(|_| true),
        }
    }

    /// Platforms to query for token packages. An unfiltered run only visits
    /// platforms that implement package queries; an explicit selection is
    /// honored as given so an unsupported platform still gets its failure
    /// row.
    pub fn select_package_platforms(
        &self,
        requested: Option<&[String]>,
    ) -> Result<Vec<String>, HandlerError> {
        match requested {
            Some(names) => Ok(names.iter().map(|n| n.to_ascii_lowercase()).collect()),
            None => self.enabled_platforms(|d| d.supports_packages),
        }
    }

    fn enabled_platforms(
        &self,
        keep: fn(&crate::registry::PlatformDescriptor) -> bool,
    ) -> Result<Vec<String>, HandlerError> {
        let mut names = Vec::new();
        for desc in PlatformRegistry::all() {
            if !keep(desc) {
                continue;
            }
            let cfg = self.resolver.resolve((desc.defaults)())?;
            if cfg.enabled {
                names.push(desc.name.to_string());
            }
        }
        Ok(names)
    }

    // ------------------------------------------------------------------
    // Fan-out
    // ------------------------------------------------------------------

    /// Queries balances for `platforms`, one outcome per platform, in
    /// input order.
    pub async fn check_balances(
        &self,
        platforms: &[String],
    ) -> Vec<PlatformOutcome<BalanceReport>> {
        fn op(
            handler: Arc<dyn PlatformHandler>,
            cfg: ResolvedConfig,
            client: HttpClient,
        ) -> BoxFut<BalanceReport> {
            Box::pin(async move { handler.fetch_balance(&cfg, &client).await })
        }
        self.fan_out(platforms, op).await
    }

    /// Queries token packages for `platforms`, one outcome per platform,
    /// in input order.
    pub async fn check_packages(
        &self,
        platforms: &[String],
    ) -> Vec<PlatformOutcome<Vec<TokenPackage>>> {
        fn op(
            handler: Arc<dyn PlatformHandler>,
            cfg: ResolvedConfig,
            client: HttpClient,
        ) -> BoxFut<Vec<TokenPackage>> {
            Box::pin(async move { handler.fetch_packages(&cfg, &client).await })
        }
        self.fan_out(platforms, op).await
    }

    async fn fan_out<T: Send + 'static>(
        &self,
        platforms: &[String],
        op: QueryOp<T>,
    ) -> Vec<PlatformOutcome<T>> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<(usize, PlatformOutcome<T>)> = JoinSet::new();

        for (slot, name) in platforms.iter().enumerate() {
            let name = name.clone();
            let semaphore = Arc::clone(&semaphore);
            let resolver = Arc::clone(&self.resolver);
            let cache = Arc::clone(&self.cache);
            let client = self.client.clone();

            tasks.spawn(async move {
                // Closing the semaphore is not part of this design; an
                // acquire error would mean the pool itself is gone.
                let _permit = match semaphore.acquire_owned().await {
                    Ok(p) => p,
                    Err(_) => {
                        let summary = FailureSummary::new(
                            FailureKind::Transport,
                            "worker pool closed".to_string(),
                        );
                        return (slot, PlatformOutcome::failed(name, summary));
                    }
                };
                let outcome = query_one(&name, &resolver, &cache, client, op).await;
                (slot, outcome)
            });
        }

        // Collect into pre-sized slots so output order matches input order
        let mut slots: Vec<Option<PlatformOutcome<T>>> =
            platforms.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, outcome)) => slots[slot] = Some(outcome),
                Err(e) => warn!(error = %e, "query task panicked"),
            }
        }

        slots
            .into_iter()
            .zip(platforms)
            .map(|(outcome, name)| {
                outcome.unwrap_or_else(|| {
                    PlatformOutcome::failed(
                        name.clone(),
                        FailureSummary::new(FailureKind::Transport, "query task aborted"),
                    )
                })
            })
            .collect()
    }
}

/// Runs one platform's query end to end, converting every error into an
/// isolated failure outcome.
async fn query_one<T: Send + 'static>(
    name: &str,
    resolver: &ConfigResolver,
    cache: &HandlerCache,
    client: HttpClient,
    op: QueryOp<T>,
) -> PlatformOutcome<T> {
    let result = async {
        let descriptor = PlatformRegistry::require(name)?;
        let cfg = resolver.resolve((descriptor.defaults)())?;
        let handler = cache.get_or_create(name)?;
        let deadline = std::time::Duration::from_secs(cfg.timeout_secs);
        let timeout_secs = cfg.timeout_secs;

        match tokio::time::timeout(deadline, op(handler, cfg, client)).await {
            Ok(result) => result,
            Err(_) => Err(HandlerError::Timeout(timeout_secs)),
        }
    }
    .await;

    match result {
        Ok(payload) => {
            debug!(platform = %name, "query succeeded");
            PlatformOutcome::ok(name, payload)
        }
        Err(e) => {
            warn!(platform = %name, error = %e, "query failed");
            PlatformOutcome::failed(name, e.into_summary())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver_with(global_yaml: &str) -> (tempfile::TempDir, ConfigResolver) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.yaml"), global_yaml).unwrap();
        let resolver = ConfigResolver::with_dir(dir.path().to_path_buf()).unwrap();
        (dir, resolver)
    }

    fn deepseek_body() -> serde_json::Value {
        serde_json::json!({
            "is_available": true,
            "balance_infos": [
                {"currency": "CNY", "total_balance": "110.00"}
            ]
        })
    }

    #[tokio::test]
    async fn outcomes_match_input_order_even_with_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/user/balance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(deepseek_body()))
            .mount(&server)
            .await;

        let yaml = format!(
            "platforms:\n  deepseek:\n    endpoint: \"{}/v1/user/balance\"\n    api_key: \"sk-test\"\n",
            server.uri()
        );
        let (_dir, resolver) = resolver_with(&yaml);
        let aggregator = Aggregator::new(resolver).unwrap();

        let platforms = vec![
            "no-such-platform".to_string(),
            "deepseek".to_string(),
            "zhipu".to_string(), // no cookie configured, fails with config error
        ];
        let outcomes = aggregator.check_balances(&platforms).await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].platform, "no-such-platform");
        assert!(!outcomes[0].is_ok());
        assert_eq!(
            outcomes[0].outcome.as_ref().unwrap_err().kind,
            FailureKind::Config
        );

        assert_eq!(outcomes[1].platform, "deepseek");
        let report = outcomes[1].payload().expect("deepseek should succeed");
        assert_eq!(report.balance.value(), Some(110.0));
        assert_eq!(report.currency, "CNY");

        assert_eq!(outcomes[2].platform, "zhipu");
        assert!(!outcomes[2].is_ok());
    }

    #[tokio::test]
    async fn one_transport_failure_does_not_block_siblings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/user/balance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(deepseek_body()))
            .mount(&server)
            .await;

        // moonshot points at a closed port, deepseek at the mock
        let yaml = format!(
            concat!(
                "platforms:\n",
                "  deepseek:\n",
                "    endpoint: \"{}/v1/user/balance\"\n",
                "    api_key: \"sk-test\"\n",
                "  moonshot:\n",
                "    endpoint: \"http://127.0.0.1:9/v1/users/me/balance\"\n",
                "    api_key: \"sk-test\"\n",
                "    timeout_secs: 2\n",
            ),
            server.uri()
        );
        let (_dir, resolver) = resolver_with(&yaml);
        let aggregator = Aggregator::new(resolver).unwrap();

        let platforms = vec!["moonshot".to_string(), "deepseek".to_string()];
        let outcomes = aggregator.check_balances(&platforms).await;

        assert!(!outcomes[0].is_ok());
        assert_eq!(
            outcomes[0].outcome.as_ref().unwrap_err().kind,
            FailureKind::Transport
        );
        assert!(outcomes[1].is_ok());
    }

    #[tokio::test]
    async fn package_selection_skips_balance_only_platforms() {
        // Enable deepseek (no packages) and code88 (packages) in the global file
        let yaml = concat!(
            "platforms:\n",
            "  code88:\n",
            "    enabled: true\n",
            "    console_token: \"tok\"\n",
        );
        let (_dir, resolver) = resolver_with(yaml);
        let aggregator = Aggregator::new(resolver).unwrap();

        let selected = aggregator.select_package_platforms(None).unwrap();
        assert!(selected.contains(&"code88".to_string()));
        assert!(!selected.contains(&"deepseek".to_string()));

        // An explicit request for an unsupported platform still yields a row
        let requested = vec!["deepseek".to_string()];
        let outcomes = aggregator.check_packages(&requested).await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(
            outcomes[0].outcome.as_ref().unwrap_err().kind,
            FailureKind::Config
        );
    }
}
