//! Configuration management.

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use urlinfo::CheckerConfig;

use crate::cli::args::Cli;

/// Default config file location for this platform.
pub fn default_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("io", "urlinfo", "urlcheck")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    Ok(dirs.config_dir().join("config.toml"))
}

/// Use the explicit path if one was given, otherwise the platform default.
pub fn resolve_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    explicit.map_or_else(default_path, Ok)
}

/// Load the checker configuration, falling back to defaults when the file is missing.
pub fn load(path: &Path) -> Result<CheckerConfig> {
    CheckerConfig::load(path).with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Per-run settings from the command line that take precedence over the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub files: Vec<PathBuf>,
    pub endpoints: Vec<String>,
    pub timeout: Option<f64>,
    pub no_cache: bool,
}

impl From<&Cli> for Overrides {
    fn from(cli: &Cli) -> Self {
        Self {
            files: cli.files.clone(),
            endpoints: cli.endpoints.clone(),
            timeout: cli.timeout,
            no_cache: cli.no_cache,
        }
    }
}

impl Overrides {
    /// Replace configured sources when any were given on the command line.
    pub fn apply(self, config: &mut CheckerConfig) {
        if !self.files.is_empty() || !self.endpoints.is_empty() {
            config.file_sources = self.files;
            config.http_sources = self.endpoints;
        }
        if let Some(timeout) = self.timeout {
            config.query_timeout_secs = timeout;
        }
        if self.no_cache {
            config.cache_enabled = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_sources() {
        let mut config = CheckerConfig {
            file_sources: vec![PathBuf::from("/srv/lists/configured.csv")],
            http_sources: vec!["http://127.0.0.1:8080/lookup".into()],
            ..CheckerConfig::default()
        };
        Overrides {
            files: vec![PathBuf::from("local.txt")],
            timeout: Some(2.0),
            no_cache: true,
            ..Overrides::default()
        }
        .apply(&mut config);

        assert_eq!(config.file_sources, vec![PathBuf::from("local.txt")]);
        assert!(config.http_sources.is_empty());
        assert!((config.query_timeout_secs - 2.0).abs() < f64::EPSILON);
        assert!(!config.cache_enabled);
    }

    #[test]
    fn test_empty_overrides_keep_config() {
        let mut config = CheckerConfig {
            file_sources: vec![PathBuf::from("/srv/lists/configured.csv")],
            ..CheckerConfig::default()
        };
        let before = config.clone();
        Overrides::default().apply(&mut config);
        assert_eq!(config, before);
    }

    #[test]
    fn test_resolve_explicit_path() {
        let path = resolve_path(Some(PathBuf::from("/tmp/urlcheck.toml"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/urlcheck.toml"));
    }
}
