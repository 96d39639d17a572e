//! Checker configuration, loaded from TOML.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use urlinfo_core::{Result, UrlinfoError};
use urlinfo_sources::HttpMethod;

use crate::aggregate::DEFAULT_HIGH_CONFIDENCE;
use crate::cache::{DEFAULT_CACHE_TTL, DEFAULT_MAX_ENTRIES, MAX_CACHE_TTL};
use crate::checker::DEFAULT_QUERY_TIMEOUT;

/// Everything needed to assemble a [`Checker`](crate::Checker).
///
/// ```toml
/// cache_ttl_secs = 600
/// query_timeout_secs = 2.5
/// file_sources = ["/var/lib/urlinfo/blocklist.csv"]
/// http_sources = ["https://lookup.internal/v1/urlinfo"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// Serve repeated checks from the verdict cache
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Lifetime of a cached verdict (seconds)
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Upper bound on cached verdicts
    #[serde(default = "default_max_entries")]
    pub cache_max_entries: usize,

    /// Shared deadline for one fan-out across every source (seconds)
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: f64,

    /// Confidence above which a match is reported as malicious
    #[serde(default = "default_high_confidence")]
    pub high_confidence_threshold: f64,

    /// Local threat lists, registered in order before any HTTP source
    #[serde(default)]
    pub file_sources: Vec<PathBuf>,

    /// Remote lookup endpoints
    #[serde(default)]
    pub http_sources: Vec<String>,

    /// Request method for every HTTP source
    #[serde(default)]
    pub http_method: HttpMethod,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl_secs: default_cache_ttl(),
            cache_max_entries: default_max_entries(),
            query_timeout_secs: default_query_timeout(),
            high_confidence_threshold: default_high_confidence(),
            file_sources: Vec::new(),
            http_sources: Vec::new(),
            http_method: HttpMethod::default(),
        }
    }
}

impl CheckerConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content).map_err(|e| UrlinfoError::Config(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the config as TOML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| UrlinfoError::Config(e.to_string()))
    }

    /// Reject values the checker cannot run with
    pub fn validate(&self) -> Result<()> {
        if !self.query_timeout_secs.is_finite() || self.query_timeout_secs <= 0.0 {
            return Err(UrlinfoError::Config(format!(
                "query_timeout_secs must be a positive number, got {}",
                self.query_timeout_secs
            )));
        }
        if self.cache_ttl_secs > MAX_CACHE_TTL.as_secs() {
            return Err(UrlinfoError::Config(format!(
                "cache_ttl_secs must be at most {}, got {}",
                MAX_CACHE_TTL.as_secs(),
                self.cache_ttl_secs
            )));
        }
        if !(0.0..=1.0).contains(&self.high_confidence_threshold) {
            return Err(UrlinfoError::Config(format!(
                "high_confidence_threshold must be within [0, 1], got {}",
                self.high_confidence_threshold
            )));
        }
        Ok(())
    }

    /// Fan-out deadline as a duration
    #[must_use]
    pub fn query_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.query_timeout_secs).unwrap_or(DEFAULT_QUERY_TIMEOUT)
    }

    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

// Default value functions for serde.
const fn default_true() -> bool {
    true
}

const fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL.as_secs()
}

const fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

fn default_query_timeout() -> f64 {
    DEFAULT_QUERY_TIMEOUT.as_secs_f64()
}

const fn default_high_confidence() -> f64 {
    DEFAULT_HIGH_CONFIDENCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CheckerConfig::default();
        assert!(config.cache_enabled);
        assert_eq!(config.cache_ttl_secs, 3600);
        assert_eq!(config.cache_max_entries, 10_000);
        assert_eq!(config.query_timeout(), Duration::from_secs(5));
        assert!(config.file_sources.is_empty());
        assert_eq!(config.http_method, HttpMethod::Get);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: CheckerConfig = toml::from_str(
            r#"
            query_timeout_secs = 0.5
            http_sources = ["http://127.0.0.1:8080/lookup"]
            http_method = "POST"
            "#,
        )
        .unwrap();
        assert_eq!(config.query_timeout(), Duration::from_millis(500));
        assert_eq!(config.http_method, HttpMethod::Post);
        assert_eq!(config.cache_ttl_secs, 3600);
        assert_eq!(config.http_sources.len(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = CheckerConfig {
            query_timeout_secs: 0.0,
            ..CheckerConfig::default()
        };
        assert!(matches!(config.validate(), Err(UrlinfoError::Config(_))));

        let config = CheckerConfig {
            high_confidence_threshold: 1.5,
            ..CheckerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = CheckerConfig {
            cache_ttl_secs: u64::MAX,
            ..CheckerConfig::default()
        };
        assert!(matches!(config.validate(), Err(UrlinfoError::Config(_))));

        let config = CheckerConfig {
            cache_ttl_secs: MAX_CACHE_TTL.as_secs(),
            ..CheckerConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_and_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("urlinfo.toml");
        assert_eq!(CheckerConfig::load(&path).unwrap(), CheckerConfig::default());

        let config = CheckerConfig {
            file_sources: vec![PathBuf::from("/srv/lists/blocklist.csv")],
            cache_enabled: false,
            ..CheckerConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(CheckerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urlinfo.toml");
        std::fs::write(&path, "cache_ttl_secs = \"soon\"").unwrap();
        assert!(matches!(CheckerConfig::load(&path), Err(UrlinfoError::Config(_))));
    }
}
