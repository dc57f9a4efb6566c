//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use riskmine_worker::PoolOverrides;
use std::path::PathBuf;

/// Riskmine - Extract, classify and mitigate risk factors from regulatory filings.
#[derive(Debug, Parser)]
#[command(name = "riskmine")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overriding the configuration
    #[arg(long, global = true, env = "RISKMINE_DATABASE")]
    pub database: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest, enrich and mitigate until no work remains
    Run(ManifestArgs),

    /// Ingest filings listed in a manifest
    Ingest(ManifestArgs),

    /// Enrich pending documents
    Enrich(PoolArgs),

    /// Suggest mitigations for unmitigated statements
    Mitigate(PoolArgs),

    /// Show document and statement counts
    Status,

    /// Apply additive schema migrations
    Migrate,

    /// Assign company names from a JSON map of entity key to name
    Names(NamesArgs),
}

/// Arguments for commands that read a manifest.
#[derive(Debug, Args)]
pub struct ManifestArgs {
    /// Manifest of local filings (defaults to ingest.manifest)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,
}

/// Pool tunables for the enrich and mitigate commands.
#[derive(Debug, Args)]
pub struct PoolArgs {
    /// Units leased per cycle
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub limit: Option<u64>,

    /// Units processed concurrently
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_workers: Option<u64>,

    /// Seconds between submissions
    #[arg(long)]
    pub sleep: Option<f64>,

    /// Keep running cycles until Ctrl-C
    #[arg(long = "loop")]
    pub continuous: bool,
}

impl PoolArgs {
    /// Flags as pool overrides
    pub fn overrides(&self) -> PoolOverrides {
        PoolOverrides {
            limit: self.limit.map(|n| n as usize),
            max_workers: self.max_workers.map(|n| n as usize),
            submit_delay_secs: self.sleep,
            attempt_warning_threshold: None,
        }
    }
}

/// Arguments for the names command.
#[derive(Debug, Args)]
pub struct NamesArgs {
    /// JSON object mapping entity key to company name
    #[arg(short, long)]
    pub map: PathBuf,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_command() {
        let cli = Cli::parse_from(["riskmine", "status"]);
        assert!(matches!(cli.command, Command::Status));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["riskmine", "status", "--database", "other.db", "-f", "json"]);
        assert_eq!(cli.database, Some(PathBuf::from("other.db")));
        assert_eq!(cli.format, Some(CliFormat::Json));
    }

    #[test]
    fn test_enrich_flags() {
        let cli = Cli::parse_from([
            "riskmine",
            "enrich",
            "--limit",
            "40",
            "--max-workers",
            "8",
            "--sleep",
            "0.5",
            "--loop",
        ]);
        let Command::Enrich(args) = cli.command else {
            panic!("Expected Enrich command");
        };
        assert!(args.continuous);

        let overrides = args.overrides();
        assert_eq!(overrides.limit, Some(40));
        assert_eq!(overrides.max_workers, Some(8));
        assert_eq!(overrides.submit_delay_secs, Some(0.5));
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(Cli::try_parse_from(["riskmine", "mitigate", "--limit", "0"]).is_err());
    }

    #[test]
    fn test_names_requires_map() {
        assert!(Cli::try_parse_from(["riskmine", "names"]).is_err());
        let cli = Cli::parse_from(["riskmine", "names", "--map", "names.json"]);
        assert!(matches!(cli.command, Command::Names(_)));
    }
}
