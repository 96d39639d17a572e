//! The URL checker: normalization, caching and concurrent source fan-out.

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use urlinfo_core::{HealthSnapshot, NormalizedUrl, Result, ServiceStatus, UrlinfoError, Verdict};
use urlinfo_sources::{FileLoader, HttpLoader, SourceLoader};

use crate::aggregate::{aggregate, SourceOutcome, DEFAULT_HIGH_CONFIDENCE};
use crate::cache::{VerdictCache, DEFAULT_CACHE_TTL, DEFAULT_MAX_ENTRIES};
use crate::config::CheckerConfig;
use crate::stats::{CheckerStats, StatsSnapshot};

/// Default deadline shared by all sources during one check
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of a single check
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub verdict: Verdict,
    /// True if the verdict came from the cache
    pub cached: bool,
    /// Time spent answering
    pub elapsed: Duration,
}

/// Service health as reported to operators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: ServiceStatus,
    pub sources: HealthSnapshot,
    pub stats: StatsSnapshot,
}

/// Checks URLs against every registered source.
///
/// Cheap to clone; clones share sources, cache and statistics.
///
/// # Example
///
/// ```rust,ignore
/// use urlinfo::{Checker, FileLoader};
///
/// let checker = Checker::builder()
///     .source(FileLoader::new("file-blocklist", "/srv/lists/blocklist.csv"))
///     .build()?;
/// checker.initialize().await?;
///
/// let outcome = checker.check("evil.net/login").await?;
/// println!("{} -> {}", outcome.verdict.url, outcome.verdict.threat_level);
/// ```
#[derive(Debug, Clone)]
pub struct Checker {
    inner: Arc<CheckerInner>,
}

#[derive(Debug)]
struct CheckerInner {
    sources: Vec<Arc<dyn SourceLoader>>,
    cache: VerdictCache,
    cache_ttl: Duration,
    query_timeout: Duration,
    high_confidence: f64,
    ready: AtomicBool,
    stats: CheckerStats,
}

impl Checker {
    /// Create a builder
    #[must_use]
    pub fn builder() -> CheckerBuilder {
        CheckerBuilder::new()
    }

    /// Assemble a checker from configuration.
    ///
    /// File sources are registered first, then HTTP sources, so file answers
    /// win confidence ties.
    pub fn from_config(config: &CheckerConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Self::builder()
            .cache_enabled(config.cache_enabled)
            .cache_ttl(config.cache_ttl())
            .max_cache_entries(config.cache_max_entries)
            .query_timeout(config.query_timeout())
            .high_confidence_threshold(config.high_confidence_threshold);

        let mut used = HashSet::new();
        for path in &config.file_sources {
            let id = unique_id(&mut used, format!("file-{}", file_label(path)));
            builder = builder.source(FileLoader::new(id, path));
        }
        for (idx, endpoint) in config.http_sources.iter().enumerate() {
            let id = unique_id(&mut used, format!("http-endpoint-{idx}"));
            let loader = HttpLoader::builder(id, endpoint)
                .method(config.http_method)
                .timeout(config.query_timeout())
                .build()
                .map_err(|e| UrlinfoError::Config(format!("http source {endpoint}: {e}")))?;
            builder = builder.source(loader);
        }

        builder.build()
    }

    /// Bootstrap every source concurrently.
    ///
    /// The checker accepts queries only after all sources initialized; the
    /// first failure is returned and the checker stays not ready.
    pub async fn initialize(&self) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }

        let started = Instant::now();
        let results = join_all(
            self.inner
                .sources
                .iter()
                .map(|source| async move { (source.id(), source.initialize().await) }),
        )
        .await;

        for (id, result) in results {
            if let Err(e) = result {
                error!(source = id, error = %e, "source failed to initialize");
                return Err(e.into_service_error(id));
            }
        }

        self.inner.ready.store(true, Ordering::Release);
        info!(
            sources = self.inner.sources.len(),
            elapsed = ?started.elapsed(),
            "URL checker ready"
        );
        Ok(())
    }

    /// Whether `initialize` has completed
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::Acquire)
    }

    /// Check a raw URL.
    ///
    /// Malformed input is rejected before the cache or any source is touched.
    pub async fn check(&self, raw: &str) -> Result<CheckOutcome> {
        let url = self.admit(NormalizedUrl::parse(raw))?;
        self.check_normalized(url).await
    }

    /// Check a URL given as a `host[:port]` and path pair
    pub async fn check_route(&self, host_and_port: &str, path_and_query: &str) -> Result<CheckOutcome> {
        let url = self.admit(NormalizedUrl::from_route(host_and_port, path_and_query))?;
        self.check_normalized(url).await
    }

    fn admit(&self, parsed: Result<NormalizedUrl>) -> Result<NormalizedUrl> {
        if let Err(e) = &parsed {
            self.inner.stats.record_invalid_url();
            debug!(error = %e, "rejected URL");
        }
        parsed
    }

    /// Check several URLs concurrently, answering in input order
    pub async fn check_many<S: AsRef<str>>(&self, urls: &[S]) -> Vec<Result<CheckOutcome>> {
        let futures: Vec<_> = urls.iter().map(|raw| self.check(raw.as_ref())).collect();
        join_all(futures).await
    }

    /// Check an already-normalized URL
    #[instrument(skip(self, url), fields(url = %url))]
    pub async fn check_normalized(&self, url: NormalizedUrl) -> Result<CheckOutcome> {
        if !self.is_ready() {
            return Err(UrlinfoError::NotReady);
        }

        let started = Instant::now();
        self.inner.stats.record_check();

        if let Some(verdict) = self.inner.cache.get(&url) {
            self.inner.stats.record_cache_hit();
            debug!("cache hit");
            return Ok(CheckOutcome {
                verdict,
                cached: true,
                elapsed: started.elapsed(),
            });
        }
        self.inner.stats.record_cache_miss();

        let outcomes = self.fan_out(&url).await;
        let verdict = aggregate(url.clone(), &outcomes, self.inner.high_confidence);
        debug!(
            malicious = verdict.is_malicious,
            level = %verdict.threat_level,
            sources = verdict.sources_queried.len(),
            "check complete"
        );

        self.inner.cache.set(url, verdict.clone(), self.inner.cache_ttl);
        Ok(CheckOutcome {
            verdict,
            cached: false,
            elapsed: started.elapsed(),
        })
    }

    /// Query every source under one shared deadline, in registration order
    async fn fan_out(&self, url: &NormalizedUrl) -> Vec<(String, SourceOutcome)> {
        let deadline = Instant::now() + self.inner.query_timeout;

        let queries = self.inner.sources.iter().map(|source| async move {
            let outcome = match tokio::time::timeout_at(deadline, source.query(url, deadline)).await {
                Ok(result) => SourceOutcome::from(result),
                Err(_) => SourceOutcome::TimedOut,
            };
            (source.id().to_string(), outcome)
        });
        let outcomes = join_all(queries).await;

        for (id, outcome) in &outcomes {
            match outcome {
                SourceOutcome::Failed(reason) => {
                    self.inner.stats.record_source_failure();
                    warn!(source = %id, %reason, "source query failed");
                }
                SourceOutcome::TimedOut => {
                    self.inner.stats.record_source_timeout();
                    warn!(source = %id, "source query timed out");
                }
                SourceOutcome::Match(_) | SourceOutcome::Clean => {}
            }
        }
        if !outcomes.iter().any(|(_, outcome)| outcome.answered()) {
            self.inner.stats.record_degraded();
            warn!("no source answered; verdict defaults to safe");
        }

        outcomes
    }

    /// Per-source readiness, keyed by source id
    #[must_use]
    pub fn health_snapshot(&self) -> HealthSnapshot {
        self.inner
            .sources
            .iter()
            .map(|source| (source.id().to_string(), source.status()))
            .collect()
    }

    /// Overall service health
    #[must_use]
    pub fn health(&self) -> HealthReport {
        let sources = self.health_snapshot();
        HealthReport {
            status: ServiceStatus::from_snapshot(self.is_ready(), &sources),
            sources,
            stats: self.stats(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// The verdict cache
    #[must_use]
    pub fn cache(&self) -> &VerdictCache {
        &self.inner.cache
    }

    /// Registered source ids, in registration order
    #[must_use]
    pub fn source_ids(&self) -> Vec<&str> {
        self.inner.sources.iter().map(|source| source.id()).collect()
    }

    #[must_use]
    pub fn query_timeout(&self) -> Duration {
        self.inner.query_timeout
    }
}

/// Builder for [`Checker`]
#[derive(Debug)]
pub struct CheckerBuilder {
    sources: Vec<Arc<dyn SourceLoader>>,
    cache_enabled: bool,
    cache_ttl: Duration,
    max_cache_entries: usize,
    query_timeout: Duration,
    high_confidence: f64,
}

impl CheckerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            cache_enabled: true,
            cache_ttl: DEFAULT_CACHE_TTL,
            max_cache_entries: DEFAULT_MAX_ENTRIES,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            high_confidence: DEFAULT_HIGH_CONFIDENCE,
        }
    }

    /// Register a source. Registration order decides confidence ties.
    #[must_use]
    pub fn source(self, source: impl SourceLoader + 'static) -> Self {
        self.shared_source(Arc::new(source))
    }

    /// Register a source that is also held elsewhere
    #[must_use]
    pub fn shared_source(mut self, source: Arc<dyn SourceLoader>) -> Self {
        self.sources.push(source);
        self
    }

    #[must_use]
    pub const fn cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    #[must_use]
    pub const fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    #[must_use]
    pub const fn max_cache_entries(mut self, max: usize) -> Self {
        self.max_cache_entries = max;
        self
    }

    /// Deadline shared by all sources during one check
    #[must_use]
    pub const fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Confidence above which a match is reported as malicious
    #[must_use]
    pub const fn high_confidence_threshold(mut self, threshold: f64) -> Self {
        self.high_confidence = threshold;
        self
    }

    /// Build the checker. Source ids must be unique.
    pub fn build(self) -> Result<Checker> {
        if let Some(dup) = duplicate_id(&self.sources) {
            return Err(UrlinfoError::Config(format!("duplicate source id: {dup}")));
        }
        if !(0.0..=1.0).contains(&self.high_confidence) {
            return Err(UrlinfoError::Config(format!(
                "high confidence threshold must be within [0, 1], got {}",
                self.high_confidence
            )));
        }

        let cache = if self.cache_enabled {
            VerdictCache::new(self.max_cache_entries)
        } else {
            VerdictCache::disabled()
        };

        Ok(Checker {
            inner: Arc::new(CheckerInner {
                sources: self.sources,
                cache,
                cache_ttl: self.cache_ttl,
                query_timeout: self.query_timeout,
                high_confidence: self.high_confidence,
                ready: AtomicBool::new(false),
                stats: CheckerStats::default(),
            }),
        })
    }
}

impl Default for CheckerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn duplicate_id(sources: &[Arc<dyn SourceLoader>]) -> Option<String> {
    let mut seen = HashSet::new();
    sources
        .iter()
        .map(|source| source.id())
        .find(|id| !seen.insert(*id))
        .map(str::to_string)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

/// Suffix `base` with a counter until it is unused
fn unique_id(used: &mut HashSet<String>, base: String) -> String {
    let mut id = base.clone();
    let mut n = 2;
    while used.contains(&id) {
        id = format!("{base}-{n}");
        n += 1;
    }
    used.insert(id.clone());
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use urlinfo_core::{ThreatLevel, ThreatType};
    use urlinfo_sources::FileEntry;

    fn blocklist() -> FileLoader {
        FileLoader::from_entries(
            "file-blocklist",
            [FileEntry::parse("evil.net").unwrap().with_threat(ThreatType::Phishing, 0.9)],
        )
    }

    #[tokio::test]
    async fn test_not_ready_before_initialize() {
        let checker = Checker::builder().source(blocklist()).build().unwrap();
        assert!(matches!(
            checker.check("http://evil.net/").await,
            Err(UrlinfoError::NotReady)
        ));
        assert_eq!(checker.health().status, ServiceStatus::NotInitialized);

        checker.initialize().await.unwrap();
        let outcome = checker.check("http://evil.net/").await.unwrap();
        assert_eq!(outcome.verdict.threat_level, ThreatLevel::Malicious);
        assert_eq!(checker.health().status, ServiceStatus::Healthy);
    }

    #[tokio::test]
    async fn test_invalid_url_is_counted_not_cached() {
        let checker = Checker::builder().source(blocklist()).build().unwrap();
        checker.initialize().await.unwrap();

        let err = checker.check("ftp://evil.net/").await.unwrap_err();
        assert!(err.is_client_error());
        assert!(checker.check_route("evil.net:99999", "/").await.is_err());

        let stats = checker.stats();
        assert_eq!(stats.invalid_urls, 2);
        assert_eq!(stats.checks, 0);
        assert!(checker.cache().is_empty());
    }

    #[tokio::test]
    async fn test_check_route_and_many() {
        let checker = Checker::builder().source(blocklist()).build().unwrap();
        checker.initialize().await.unwrap();

        let outcome = checker.check_route("evil.net:80", "/a?b=c").await.unwrap();
        assert!(outcome.verdict.is_malicious);
        assert_eq!(outcome.verdict.url.as_str(), "http://evil.net/a?b=c");

        let results = checker.check_many(&["github.com", "not a url", "evil.net"]).await;
        assert!(!results[0].as_ref().unwrap().verdict.is_malicious);
        assert!(results[1].is_err());
        assert!(results[2].as_ref().unwrap().verdict.is_malicious);
    }

    #[tokio::test]
    async fn test_unbounded_ttl_from_config_still_caches() {
        let config = CheckerConfig {
            cache_ttl_secs: u64::MAX,
            ..CheckerConfig::default()
        };
        let checker = Checker::builder()
            .source(blocklist())
            .cache_ttl(config.cache_ttl())
            .build()
            .unwrap();
        checker.initialize().await.unwrap();

        assert!(!checker.check("http://evil.net/").await.unwrap().cached);
        assert!(checker.check("http://evil.net/").await.unwrap().cached);
    }

    #[test]
    fn test_builder_rejects_duplicate_ids() {
        let result = Checker::builder().source(blocklist()).source(blocklist()).build();
        assert!(matches!(result, Err(UrlinfoError::Config(_))));
    }

    #[test]
    fn test_from_config_registration_order() {
        let config = CheckerConfig {
            file_sources: vec![
                PathBuf::from("/srv/a/blocklist.csv"),
                PathBuf::from("/srv/b/blocklist.csv"),
            ],
            http_sources: vec!["http://127.0.0.1:8080/lookup".into()],
            ..CheckerConfig::default()
        };
        let checker = Checker::from_config(&config).unwrap();
        assert_eq!(
            checker.source_ids(),
            vec!["file-blocklist.csv", "file-blocklist.csv-2", "http-endpoint-0"]
        );
        assert_eq!(checker.query_timeout(), DEFAULT_QUERY_TIMEOUT);
    }

    #[test]
    fn test_from_config_rejects_bad_endpoint() {
        let config = CheckerConfig {
            http_sources: vec!["not a url".into()],
            ..CheckerConfig::default()
        };
        assert!(matches!(Checker::from_config(&config), Err(UrlinfoError::Config(_))));
    }
}
