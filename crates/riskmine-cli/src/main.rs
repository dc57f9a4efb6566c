//! Riskmine CLI - Extract, classify and mitigate risk factors from regulatory filings.

use clap::Parser;
use riskmine_cli::commands;
use riskmine_cli::{AppConfig, Cli, Command, Formatter};
use riskmine_store::SqliteStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Log to stderr so stdout stays clean for JSON output
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> riskmine_cli::Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.database {
        config.store.path = path;
    }
    config.validate()?;

    let format = cli.format.map(Into::into).unwrap_or(config.output.format);
    let color_enabled = !cli.no_color && config.output.color;
    let formatter = Formatter::new(format, color_enabled);

    // Every other command expects the schema to exist
    if !matches!(cli.command, Command::Migrate) {
        let store = config.store.clone();
        tokio::task::spawn_blocking(move || SqliteStore::open(&store)).await??;
    }

    match cli.command {
        Command::Run(args) => commands::execute_run(args, &config, &formatter).await?,
        Command::Ingest(args) => commands::execute_ingest(args, &config, &formatter).await?,
        Command::Enrich(args) => commands::execute_enrich(args, &config, &formatter).await?,
        Command::Mitigate(args) => commands::execute_mitigate(args, &config, &formatter).await?,
        Command::Status => commands::execute_status(&config, &formatter).await?,
        Command::Migrate => commands::execute_migrate(&config, &formatter).await?,
        Command::Names(args) => commands::execute_names(args, &config, &formatter).await?,
    }

    Ok(())
}
