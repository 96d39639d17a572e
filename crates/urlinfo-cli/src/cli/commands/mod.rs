//! Command implementations.

pub mod check;
pub mod config;
pub mod health;
pub mod lookup;

use std::path::PathBuf;
use urlinfo::{Checker, CheckerConfig};

use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Effective checker configuration, flags applied
    pub config: CheckerConfig,

    /// Where the configuration was read from
    pub config_path: PathBuf,

    /// Output format
    pub output_format: OutputFormat,

    /// Verbose output
    pub verbose: bool,

    /// Disable colors
    pub no_color: bool,
}

impl Context {
    /// Build a checker from the effective configuration and bootstrap its sources.
    pub async fn checker(&self) -> anyhow::Result<Checker> {
        if self.config.file_sources.is_empty() && self.config.http_sources.is_empty() {
            anyhow::bail!(
                "No threat sources configured.\n\n\
                 Add one with:\n  \
                 1. --file <PATH> for a local threat list\n  \
                 2. --endpoint <URL> for a lookup service\n  \
                 3. file_sources / http_sources in {}",
                self.config_path.display()
            );
        }

        let checker = Checker::from_config(&self.config)?;
        checker.initialize().await?;
        Ok(checker)
    }
}
