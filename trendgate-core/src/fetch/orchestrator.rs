//! The fetch pipeline
//!
//! ```text
//! cache check ─hit──────────────────────────────────────────────▶ value
//!      │
//!     miss ─▶ cooldown wait ─▶ provider (retry transient) ─ok──▶ cache set ─▶ value
//!                                       │
//!                                       └─failure──▶ classified FetchError (never cached)
//! ```
//!
//! The cache and the cooldown gate are never locked at the same time: the
//! cache lock is released before the gate is touched, and the gate is done
//! before the result is stored.

use super::error::{FetchError, FetchResult};
use super::inflight::InflightTable;
use super::retry::RetryPolicy;
use crate::cache::{CacheKey, CacheStore};
use crate::config::TrendGateConfig;
use crate::provider::{InterestTimeline, ProviderError, RelatedQueries, TrendsProvider};
use crate::throttle::CooldownGate;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;

/// Most keywords the provider compares in one interest query
pub const MAX_COMPARED_KEYWORDS: usize = 5;

/// Decides whether a successful payload is actually a failure
type Reject<V> = fn(&CacheKey, &V) -> Option<FetchError>;

/// Cache, cooldown and in-flight table for one kind of query
struct Lane<V> {
    name: &'static str,
    cache: Arc<CacheStore<V>>,
    gate: Arc<CooldownGate>,
    inflight: Arc<InflightTable<V>>,
}

impl<V> Lane<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn new(name: &'static str, cache: Arc<CacheStore<V>>, gate: Arc<CooldownGate>) -> Self {
        Self { name, cache, gate, inflight: Arc::new(InflightTable::new()) }
    }

    /// Serve from cache, or run (or join) a load
    async fn fetch<F>(&self, key: &CacheKey, coalesce: bool, start: F) -> FetchResult<V>
    where
        F: FnOnce() -> BoxFuture<'static, FetchResult<V>>,
    {
        if let Some(hit) = self.cache.get(key) {
            log::debug!("Cache hit for {} {}", self.name, key);
            return Ok(hit);
        }
        log::debug!("Cache miss for {} {}", self.name, key);

        if !coalesce {
            return start().await;
        }

        let (load, started) = self.inflight.join_or_start(key, start);
        if !started {
            log::debug!("Joining in-flight {} load for {}", self.name, key);
        }
        load.await
    }

    /// Cooldown, provider call with retry, then populate the cache
    ///
    /// The returned future owns everything it touches. A provider result is
    /// stored synchronously right after the call returns, so a caller that
    /// goes away later does not lose it for everyone else.
    fn load<F, Fut>(
        &self,
        key: CacheKey,
        retry: RetryPolicy,
        reject: Reject<V>,
        call: F,
    ) -> BoxFuture<'static, FetchResult<V>>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, ProviderError>> + Send + 'static,
    {
        let name = self.name;
        let cache = Arc::clone(&self.cache);
        let gate = Arc::clone(&self.gate);

        async move {
            let waited = gate.wait(&key).await;
            if !waited.is_zero() {
                log::debug!("{} {} waited {:?} for cooldown", name, key, waited);
            }

            match retry.run(&key, call).await {
                Ok(value) => {
                    if let Some(rejection) = reject(&key, &value) {
                        log::info!("No {} data for {}, not caching", name, key);
                        return Err(rejection);
                    }
                    cache.set(key.clone(), value.clone());
                    log::info!("Fetched and cached {} for {}", name, key);
                    Ok(value)
                }
                Err(err) => {
                    let failure = FetchError::from(err);
                    log::warn!("{} fetch for {} failed ({}): {}", name, key, failure.kind, failure);
                    Err(failure)
                }
            }
        }
        .boxed()
    }
}

fn reject_empty_related(key: &CacheKey, value: &RelatedQueries) -> Option<FetchError> {
    value
        .is_empty()
        .then(|| FetchError::not_found(format!("No related queries found for '{}'", key.keyword())))
}

/// An empty timeline is a valid answer
fn accept_any_timeline(_: &CacheKey, _: &InterestTimeline) -> Option<FetchError> {
    None
}

/// Fronts a [`TrendsProvider`] with caching, per-key cooldown and retry
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use trendgate_core::cache::CacheStore;
/// use trendgate_core::fetch::{FetchOrchestrator, RetryPolicy};
/// use trendgate_core::provider::{GoogleTrendsProvider, GoogleTrendsSettings};
/// use trendgate_core::throttle::CooldownGate;
///
/// # async fn demo() -> anyhow::Result<()> {
/// let provider = Arc::new(GoogleTrendsProvider::new(GoogleTrendsSettings::default())?);
/// let orchestrator = FetchOrchestrator::new(
///     provider,
///     Arc::new(CacheStore::new(Duration::from_secs(3600), 300)),
///     Arc::new(CooldownGate::new(Duration::from_secs(5))),
///     RetryPolicy::default(),
/// );
/// let related = orchestrator.fetch_related("hvac", "US", "today 12-m").await?;
/// println!("{} top queries", related.top.len());
/// # Ok(())
/// # }
/// ```
pub struct FetchOrchestrator {
    provider: Arc<dyn TrendsProvider>,
    retry: RetryPolicy,
    coalesce: bool,
    related: Lane<RelatedQueries>,
    interest: Lane<InterestTimeline>,
}

impl FetchOrchestrator {
    /// Build an orchestrator around explicitly owned components
    ///
    /// Interest-over-time queries get their own cache and gate with the
    /// same limits; override them with [`with_interest_lane`](Self::with_interest_lane).
    /// Coalescing starts disabled.
    pub fn new(
        provider: Arc<dyn TrendsProvider>,
        cache: Arc<CacheStore<RelatedQueries>>,
        gate: Arc<CooldownGate>,
        retry: RetryPolicy,
    ) -> Self {
        let interest_cache = Arc::new(CacheStore::new(cache.ttl(), cache.max_items()));
        let interest_gate =
            Arc::new(CooldownGate::with_max_tracked_keys(gate.interval(), gate.max_tracked_keys()));

        Self {
            provider,
            retry,
            coalesce: false,
            related: Lane::new("related queries", cache, gate),
            interest: Lane::new("interest", interest_cache, interest_gate),
        }
    }

    /// Build every component from configuration
    pub fn from_config(config: &TrendGateConfig, provider: Arc<dyn TrendsProvider>) -> Self {
        let cache = Arc::new(CacheStore::new(config.cache.ttl(), config.cache.max_items));
        let gate = Arc::new(CooldownGate::with_max_tracked_keys(
            config.throttle.cooldown(),
            config.throttle.max_tracked_keys,
        ));

        Self::new(provider, cache, gate, config.retry.policy())
            .with_coalescing(config.throttle.coalesce_requests)
    }

    pub fn with_interest_lane(
        mut self,
        cache: Arc<CacheStore<InterestTimeline>>,
        gate: Arc<CooldownGate>,
    ) -> Self {
        self.interest = Lane::new("interest", cache, gate);
        self
    }

    /// Share one provider call between concurrent misses for the same key
    pub fn with_coalescing(mut self, enabled: bool) -> Self {
        self.coalesce = enabled;
        self
    }

    pub fn related_cache(&self) -> &Arc<CacheStore<RelatedQueries>> {
        &self.related.cache
    }

    pub fn related_gate(&self) -> &Arc<CooldownGate> {
        &self.related.gate
    }

    pub fn interest_cache(&self) -> &Arc<CacheStore<InterestTimeline>> {
        &self.interest.cache
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn coalescing(&self) -> bool {
        self.coalesce
    }

    /// Related queries for one keyword in one region
    ///
    /// A keyword the provider knows but has nothing for is `NotFound` and is
    /// not cached. Failures are never cached.
    pub async fn fetch_related(
        &self,
        keyword: &str,
        geo: &str,
        timeframe: &str,
    ) -> FetchResult<RelatedQueries> {
        let key = CacheKey::new(keyword, geo);
        if key.keyword().is_empty() {
            return Err(FetchError::validation("Missing q param"));
        }

        let provider = Arc::clone(&self.provider);
        let keyword = keyword.trim().to_string();
        let geo = key.geo().to_string();
        let timeframe = timeframe.to_string();
        let call = move || {
            let provider = Arc::clone(&provider);
            let (keyword, geo, timeframe) = (keyword.clone(), geo.clone(), timeframe.clone());
            async move { provider.related_queries(&keyword, &geo, &timeframe).await }
        };

        self.related
            .fetch(&key, self.coalesce, || {
                self.related.load(key.clone(), self.retry, reject_empty_related, call)
            })
            .await
    }

    /// Interest over time for up to [`MAX_COMPARED_KEYWORDS`] keywords
    pub async fn fetch_interest(
        &self,
        keywords: &[String],
        geo: &str,
        timeframe: &str,
    ) -> FetchResult<InterestTimeline> {
        let keywords: Vec<String> = keywords
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return Err(FetchError::validation("Missing q param"));
        }
        if keywords.len() > MAX_COMPARED_KEYWORDS {
            return Err(FetchError::validation(format!(
                "At most {} keywords can be compared",
                MAX_COMPARED_KEYWORDS
            )));
        }

        let key = CacheKey::for_keywords(&keywords, geo);
        let provider = Arc::clone(&self.provider);
        let requested = keywords.clone();
        let geo = key.geo().to_string();
        let timeframe = timeframe.to_string();
        let call = move || {
            let provider = Arc::clone(&provider);
            let (keywords, geo, timeframe) = (keywords.clone(), geo.clone(), timeframe.clone());
            async move { provider.interest_over_time(&keywords, &geo, &timeframe).await }
        };

        let timeline = self
            .interest
            .fetch(&key, self.coalesce, || {
                self.interest.load(key.clone(), self.retry, accept_any_timeline, call)
            })
            .await?;

        // The entry may have been stored under another caller's casing
        Ok(InterestTimeline { keywords: requested, points: timeline.points })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FailureKind;
    use crate::provider::{InterestPoint, RankedQuery};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Returns canned data and remembers what it was asked
    #[derive(Default)]
    struct EchoProvider {
        calls: AtomicU32,
        seen: Mutex<Vec<(Vec<String>, String, String)>>,
    }

    #[async_trait::async_trait]
    impl TrendsProvider for EchoProvider {
        async fn related_queries(
            &self,
            keyword: &str,
            geo: &str,
            timeframe: &str,
        ) -> Result<RelatedQueries, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push((
                vec![keyword.to_string()],
                geo.to_string(),
                timeframe.to_string(),
            ));
            Ok(RelatedQueries { top: vec![RankedQuery::new(format!("{} repair", keyword), 100)], rising: vec![] })
        }

        async fn interest_over_time(
            &self,
            keywords: &[String],
            geo: &str,
            timeframe: &str,
        ) -> Result<InterestTimeline, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push((keywords.to_vec(), geo.to_string(), timeframe.to_string()));
            if keywords.iter().any(|k| k == "empty") {
                return Ok(InterestTimeline { keywords: keywords.to_vec(), points: vec![] });
            }
            Ok(InterestTimeline {
                keywords: keywords.to_vec(),
                points: vec![InterestPoint {
                    date: chrono::NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
                    values: vec![50; keywords.len()],
                    is_partial: false,
                }],
            })
        }
    }

    fn orchestrator(provider: Arc<EchoProvider>) -> FetchOrchestrator {
        FetchOrchestrator::new(
            provider,
            Arc::new(CacheStore::new(Duration::from_secs(3600), 300)),
            Arc::new(CooldownGate::new(Duration::from_secs(5))),
            RetryPolicy::new(3, Duration::from_millis(10)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_keyword_is_validation_error() {
        let provider = Arc::new(EchoProvider::default());
        let orchestrator = orchestrator(Arc::clone(&provider));

        let err = orchestrator.fetch_related("   ", "US", "today 12-m").await.unwrap_err();
        assert_eq!(err.kind, FailureKind::Validation);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_sees_trimmed_keyword_and_upper_geo() {
        let provider = Arc::new(EchoProvider::default());
        let orchestrator = orchestrator(Arc::clone(&provider));

        orchestrator.fetch_related("  Mini Split ", "us", "now 7-d").await.unwrap();

        let seen = provider.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![(vec!["Mini Split".to_string()], "US".to_string(), "now 7-d".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_case_variants_share_cache_entry() {
        let provider = Arc::new(EchoProvider::default());
        let orchestrator = orchestrator(Arc::clone(&provider));

        let first = orchestrator.fetch_related("HVAC", "us", "today 12-m").await.unwrap();
        let second = orchestrator.fetch_related(" hvac ", "US", "today 12-m").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interest_is_cached_including_empty_series() {
        let provider = Arc::new(EchoProvider::default());
        let orchestrator = orchestrator(Arc::clone(&provider));
        let keywords = vec!["hvac".to_string(), "mini split".to_string()];

        let timeline = orchestrator.fetch_interest(&keywords, "US", "today 12-m").await.unwrap();
        assert_eq!(timeline.points.len(), 1);
        orchestrator.fetch_interest(&keywords, "us", "today 12-m").await.unwrap();

        let empty = vec!["empty".to_string()];
        assert!(orchestrator.fetch_interest(&empty, "US", "today 12-m").await.unwrap().is_empty());
        orchestrator.fetch_interest(&empty, "US", "today 12-m").await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(orchestrator.interest_cache().size(), 2);
        assert_eq!(orchestrator.related_cache().size(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interest_columns_follow_the_current_request() {
        let provider = Arc::new(EchoProvider::default());
        let orchestrator = orchestrator(Arc::clone(&provider));

        let upper = vec!["HVAC".to_string(), "Mini Split".to_string()];
        orchestrator.fetch_interest(&upper, "US", "today 12-m").await.unwrap();

        let lower = vec![" hvac".to_string(), "mini split".to_string()];
        let timeline = orchestrator.fetch_interest(&lower, "US", "today 12-m").await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(timeline.keywords, vec!["hvac".to_string(), "mini split".to_string()]);
        let row = &timeline.records()[0];
        assert_eq!(row["hvac"], 50);
        assert_eq!(row["mini split"], 50);
        assert!(row.get("HVAC").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interest_keyword_limits() {
        let provider = Arc::new(EchoProvider::default());
        let orchestrator = orchestrator(Arc::clone(&provider));

        let blank = vec![" ".to_string(), "".to_string()];
        let err = orchestrator.fetch_interest(&blank, "US", "today 12-m").await.unwrap_err();
        assert_eq!(err.kind, FailureKind::Validation);

        let too_many: Vec<String> = (0..6).map(|i| format!("kw{}", i)).collect();
        let err = orchestrator.fetch_interest(&too_many, "US", "today 12-m").await.unwrap_err();
        assert_eq!(err.kind, FailureKind::Validation);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interest_lane_can_be_replaced() {
        let provider = Arc::new(EchoProvider::default());
        let disabled = Arc::new(CacheStore::new(Duration::from_secs(3600), 0));
        let orchestrator = orchestrator(Arc::clone(&provider))
            .with_interest_lane(Arc::clone(&disabled), Arc::new(CooldownGate::new(Duration::ZERO)));
        let keywords = vec!["hvac".to_string()];

        orchestrator.fetch_interest(&keywords, "US", "today 12-m").await.unwrap();
        orchestrator.fetch_interest(&keywords, "US", "today 12-m").await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert!(Arc::ptr_eq(orchestrator.interest_cache(), &disabled));
        assert_eq!(disabled.size(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_from_config_wires_limits() {
        let mut config = TrendGateConfig::default();
        config.cache.max_items = 7;
        config.throttle.coalesce_requests = true;
        config.retry.max_retries = 4;

        let orchestrator = FetchOrchestrator::from_config(&config, Arc::new(EchoProvider::default()));
        assert_eq!(orchestrator.related_cache().max_items(), 7);
        assert_eq!(orchestrator.interest_cache().max_items(), 7);
        assert_eq!(orchestrator.related_gate().interval(), Duration::from_secs(5));
        assert_eq!(orchestrator.retry_policy().max_attempts, 4);
        assert!(orchestrator.coalescing());
    }
}
