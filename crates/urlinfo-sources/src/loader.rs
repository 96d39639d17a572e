//! The capability every threat intelligence source provides.

use async_trait::async_trait;
use tokio::time::Instant;
use urlinfo_core::{LoaderStatus, NormalizedUrl, ThreatInfo};

use crate::SourceResult;

/// A single threat intelligence source.
///
/// `query` answers with three distinct outcomes:
///
/// - `Ok(Some(info))`: the source matched the URL
/// - `Ok(None)`: the source has no record of the URL (clean)
/// - `Err(_)`: indeterminate; the source could not answer, which callers must
///   not treat as clean
#[async_trait]
pub trait SourceLoader: Send + Sync + std::fmt::Debug {
    /// Stable identifier, reported in `sources_queried` and health output
    fn id(&self) -> &str;

    /// Bootstrap the source. Called once before the first query.
    async fn initialize(&self) -> SourceResult<()>;

    /// Look up `url`, giving up no later than `deadline`
    async fn query(&self, url: &NormalizedUrl, deadline: Instant) -> SourceResult<Option<ThreatInfo>>;

    /// Current readiness
    fn status(&self) -> LoaderStatus;
}
