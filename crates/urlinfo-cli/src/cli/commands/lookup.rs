//! `urlcheck lookup` - Check a host[:port] and path pair.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::cli::args::LookupArgs;
use crate::output::{self, OutputFormat};

pub async fn execute(ctx: Context, args: LookupArgs) -> Result<()> {
    let checker = ctx.checker().await?;
    let outcome = checker.check_route(&args.host, &args.path).await?;
    let verdict = &outcome.verdict;

    match ctx.output_format {
        OutputFormat::Json => {
            let input = format!("{}{}", args.host, args.path);
            println!("{}", serde_json::to_string_pretty(&output::outcome_json(&input, &outcome))?);
        }
        OutputFormat::Pretty => {
            println!("{} {}", "URL:".bold(), verdict.url.to_string().cyan().bold());
            println!();
            println!("  {} {}", "Verdict:".bold(), output::level_label(verdict.threat_level));
            if let Some(threat_type) = verdict.threat_type {
                println!("  {} {}", "Type:".bold(), threat_type);
            }
            println!("  {} {:.2}", "Confidence:".bold(), verdict.confidence_score);

            let sources = if verdict.sources_queried.is_empty() {
                "(none answered)".dimmed().to_string()
            } else {
                verdict.sources_queried.join(", ")
            };
            println!("  {} {}", "Sources:".bold(), sources);
            println!(
                "  {} {:.1}ms{}",
                "Time:".bold(),
                output::millis(outcome.elapsed),
                if outcome.cached { " (cached)" } else { "" }
            );
        }
    }

    Ok(())
}
