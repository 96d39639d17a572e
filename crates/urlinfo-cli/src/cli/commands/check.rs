//! `urlcheck check` - Check one or more URLs.

use anyhow::Result;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};
use urlinfo::{CheckOutcome, ThreatLevel};

use super::Context;
use crate::cli::args::CheckArgs;
use crate::output::{self, OutputFormat};

#[derive(Tabled)]
struct VerdictRow {
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Verdict")]
    level: String,
    #[tabled(rename = "Type")]
    threat_type: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Sources")]
    sources: String,
    #[tabled(rename = "Cached")]
    cached: String,
    #[tabled(rename = "Time")]
    time: String,
}

impl VerdictRow {
    fn new(outcome: &CheckOutcome) -> Self {
        let verdict = &outcome.verdict;
        Self {
            url: verdict.url.to_string(),
            level: output::level_label(verdict.threat_level).to_string(),
            threat_type: verdict.threat_type.map(|t| t.to_string()).unwrap_or_default(),
            confidence: format!("{:.2}", verdict.confidence_score),
            sources: verdict.sources_queried.join(", "),
            cached: if outcome.cached { "yes" } else { "no" }.to_string(),
            time: format!("{:.1}ms", output::millis(outcome.elapsed)),
        }
    }
}

pub async fn execute(ctx: Context, args: CheckArgs) -> Result<()> {
    let checker = ctx.checker().await?;
    let results = checker.check_many(args.urls.as_slice()).await;

    let mut rows = Vec::new();
    let mut json = Vec::new();
    let mut invalid = 0;
    let mut malicious = 0;

    for (input, result) in args.urls.iter().zip(results) {
        match result {
            Ok(outcome) => {
                if outcome.verdict.is_malicious {
                    malicious += 1;
                }
                match ctx.output_format {
                    OutputFormat::Json => json.push(output::outcome_json(input, &outcome)),
                    OutputFormat::Pretty => rows.push(VerdictRow::new(&outcome)),
                }
            }
            Err(e) => {
                invalid += 1;
                match ctx.output_format {
                    OutputFormat::Json => json.push(serde_json::json!({ "input": input, "error": e.to_string() })),
                    OutputFormat::Pretty => eprintln!("{} {}", "Error:".red().bold(), e),
                }
            }
        }
    }

    match ctx.output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json)?),
        OutputFormat::Pretty if !rows.is_empty() => {
            println!("{}", Table::new(rows).with(Style::rounded()));
            if ctx.verbose {
                let stats = checker.stats();
                println!(
                    "\n{} {} checks, {} cache hits, {} source timeouts",
                    "Stats:".bold(),
                    stats.checks,
                    stats.cache_hits,
                    stats.source_timeouts
                );
            }
        }
        OutputFormat::Pretty => {}
    }

    if invalid > 0 {
        anyhow::bail!("{invalid} invalid URL(s)");
    }
    if args.strict && malicious > 0 {
        anyhow::bail!(
            "{malicious} URL(s) reported {} or {}",
            ThreatLevel::Suspicious,
            ThreatLevel::Malicious
        );
    }

    Ok(())
}
