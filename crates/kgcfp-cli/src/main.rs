//! KGCFP CLI - extraction and graph import for Chinese figure painting texts.

use anyhow::Context;
use clap::Parser;
use kgcfp_cli::commands;
use kgcfp_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // A missing .env is fine; the real environment still applies
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    let format = cli.format.map(Into::into).unwrap_or(config.output.format);
    let color_enabled = !cli.no_color && config.output.color;
    let formatter = Formatter::new(format, color_enabled);

    let db_path = cli.db.unwrap_or_else(|| config.store.path.clone());

    match cli.command {
        Command::Extract(args) => {
            commands::execute_extract(args, &config, &formatter).await?;
        }
        Command::Import(args) => {
            commands::execute_import(args, &db_path, &formatter)
                .with_context(|| format!("import into {} failed", db_path.display()))?;
        }
        Command::Stats => {
            commands::execute_stats(&db_path, &formatter)?;
        }
        Command::Search(args) => {
            commands::execute_search(args, &db_path, &formatter)?;
        }
        Command::Clear(args) => {
            commands::execute_clear(args, &db_path, &formatter)?;
        }
    }

    Ok(())
}
