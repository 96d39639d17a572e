//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Check URLs against local threat lists and remote lookup services
///
/// Sources come from the config file and can be added per run with
/// --file and --endpoint.
#[derive(Parser, Debug)]
#[command(name = "urlcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (or set URLINFO_CONFIG)
    #[arg(short, long, env = "URLINFO_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Threat list to query instead of the configured ones (repeatable)
    #[arg(short = 'f', long = "file", global = true)]
    pub files: Vec<PathBuf>,

    /// Lookup endpoint to query instead of the configured ones (repeatable)
    #[arg(short = 'e', long = "endpoint", global = true)]
    pub endpoints: Vec<String>,

    /// Deadline shared by all sources, in seconds
    #[arg(short, long, global = true)]
    pub timeout: Option<f64>,

    /// Always query the sources
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check one or more URLs
    Check(CheckArgs),

    /// Check a host[:port] and path pair
    Lookup(LookupArgs),

    /// Show readiness of every configured source
    Health,

    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// URLs to check; a missing scheme means https
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Exit with an error if any URL is reported malicious
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Host with optional port (e.g., evil.net:8080)
    pub host: String,

    /// Path and query string
    #[arg(default_value = "/")]
    pub path: String,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Show the config file path
    Path,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check_with_sources() {
        let cli = Cli::try_parse_from([
            "urlcheck",
            "check",
            "evil.net",
            "https://github.com",
            "-f",
            "a.csv",
            "--file",
            "b.txt",
            "--endpoint",
            "http://127.0.0.1:8080/lookup",
            "--timeout",
            "1.5",
            "--no-cache",
            "-o",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.files, vec![PathBuf::from("a.csv"), PathBuf::from("b.txt")]);
        assert_eq!(cli.endpoints.len(), 1);
        assert_eq!(cli.timeout, Some(1.5));
        assert!(cli.no_cache);
        assert_eq!(cli.output, Some(OutputFormat::Json));
        match cli.command {
            Commands::Check(args) => assert_eq!(args.urls, vec!["evil.net", "https://github.com"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_check_requires_url() {
        assert!(Cli::try_parse_from(["urlcheck", "check"]).is_err());
    }

    #[test]
    fn test_lookup_default_path() {
        let cli = Cli::try_parse_from(["urlcheck", "lookup", "evil.net:8080"]).unwrap();
        match cli.command {
            Commands::Lookup(args) => {
                assert_eq!(args.host, "evil.net:8080");
                assert_eq!(args.path, "/");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
