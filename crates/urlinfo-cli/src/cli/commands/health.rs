//! `urlcheck health` - Show readiness of every configured source.

use anyhow::Result;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};
use urlinfo::{Checker, ServiceStatus};

use super::Context;
use crate::output::OutputFormat;

#[derive(Tabled)]
struct SourceRow {
    #[tabled(rename = "Source")]
    id: String,
    #[tabled(rename = "Ready")]
    ready: String,
    #[tabled(rename = "Items")]
    items: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

pub async fn execute(ctx: Context) -> Result<()> {
    let checker = Checker::from_config(&ctx.config)?;

    // A failed bootstrap is part of the report, not a reason to stop
    if let Err(e) = checker.initialize().await {
        if ctx.output_format == OutputFormat::Pretty {
            eprintln!("{} {}", "Warning:".yellow().bold(), e);
        }
    }

    let report = checker.health();

    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Pretty => {
            let status = match report.status {
                ServiceStatus::Healthy => report.status.to_string().green().bold(),
                ServiceStatus::Degraded => report.status.to_string().yellow().bold(),
                ServiceStatus::NotInitialized => report.status.to_string().red().bold(),
            };
            println!("{} {}", "Status:".bold(), status);

            if report.sources.is_empty() {
                println!("\n{}", "No sources configured.".dimmed());
                return Ok(());
            }

            let rows: Vec<SourceRow> = report
                .sources
                .iter()
                .map(|(id, status)| SourceRow {
                    id: id.clone(),
                    ready: if ctx.no_color {
                        if status.ready { "yes" } else { "no" }.to_string()
                    } else if status.ready {
                        "✓".green().to_string()
                    } else {
                        "✗".red().to_string()
                    },
                    items: status.items_loaded.map(|n| n.to_string()).unwrap_or_default(),
                    detail: status.detail.clone().unwrap_or_default(),
                })
                .collect();

            println!();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
    }

    Ok(())
}
