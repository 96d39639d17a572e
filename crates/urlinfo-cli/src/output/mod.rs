//! Output formatting for different formats.

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use urlinfo::{CheckOutcome, ThreatLevel};

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed tables with colors
    #[default]
    Pretty,
    /// JSON output
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "table" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!(
                "Unknown output format: {}\n\
                 Valid formats: pretty, json",
                s
            ),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Threat level label, colored by severity.
pub fn level_label(level: ThreatLevel) -> ColoredString {
    let label = level.to_string().to_uppercase();
    match level {
        ThreatLevel::Safe => label.green().bold(),
        ThreatLevel::Suspicious => label.yellow().bold(),
        ThreatLevel::Malicious => label.red().bold(),
    }
}

/// Milliseconds with sub-millisecond precision, for display.
pub fn millis(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

/// JSON shape of a single check result.
pub fn outcome_json(input: &str, outcome: &CheckOutcome) -> serde_json::Value {
    serde_json::json!({
        "input": input,
        "verdict": outcome.verdict,
        "cached": outcome.cached,
        "elapsed_ms": millis(outcome.elapsed),
    })
}
