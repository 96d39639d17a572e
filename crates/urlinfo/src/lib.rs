//! Concurrent malicious URL checking.
//!
//! A [`Checker`] normalizes a URL, answers from its TTL cache when it can, and
//! otherwise asks every registered [`SourceLoader`] at once under a shared
//! deadline. Answers are folded into a single [`Verdict`]; sources that fail
//! or run out of time never turn a URL safe on their own.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use urlinfo::{Checker, CheckerConfig};
//!
//! #[tokio::main]
//! async fn main() -> urlinfo::Result<()> {
//!     let config = CheckerConfig {
//!         file_sources: vec!["blocklist.csv".into()],
//!         http_sources: vec!["https://lookup.internal/v1/urlinfo".into()],
//!         ..CheckerConfig::default()
//!     };
//!
//!     let checker = Checker::from_config(&config)?;
//!     checker.initialize().await?;
//!
//!     let outcome = checker.check("http://evil.net/login").await?;
//!     println!("malicious: {}", outcome.verdict.is_malicious);
//!     println!("answered by: {:?}", outcome.verdict.sources_queried);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `default` - Uses rustls for TLS
//! - `rustls` - Use rustls for TLS (recommended)
//! - `native-tls` - Use system native TLS

mod aggregate;
mod cache;
mod checker;
mod config;
mod stats;

pub use aggregate::{aggregate, SourceOutcome, DEFAULT_HIGH_CONFIDENCE};
pub use cache::{VerdictCache, DEFAULT_CACHE_TTL, DEFAULT_MAX_ENTRIES, MAX_CACHE_TTL};
pub use checker::{CheckOutcome, Checker, CheckerBuilder, HealthReport, DEFAULT_QUERY_TIMEOUT};
pub use config::CheckerConfig;
pub use stats::{CheckerStats, StatsSnapshot};

// Re-export core types
pub use urlinfo_core::*;

// Re-export sources
pub use urlinfo_sources::{
    FileEntry, FileFormat, FileLoader, HttpLoader, HttpLoaderBuilder, HttpMethod, SourceError, SourceLoader,
    SourceResult,
};
