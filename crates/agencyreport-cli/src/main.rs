mod cli;
mod commands;
mod config;
mod observability;
mod output;

use anyhow::{Result, anyhow};
use clap::Parser;

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    // Load .env file if present; a missing file is not an error.
    if let Err(e) = dotenvy::dotenv()
        && !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
    {
        eprintln!("Warning: Failed to load .env file: {e}");
    }

    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let cfg = config::loader::load_config(cli.config.as_deref())
        .map_err(|e| anyhow!("Configuration error: {e}"))?;

    let level = cli.log_level.as_deref().unwrap_or(&cfg.logging.level);
    observability::init_tracing_with_level(level);

    match &cli.command {
        Commands::Compile(args) => commands::compile(&cfg, &args.report)?,
        Commands::Run(args) => commands::run(&cfg, args).await?,
        Commands::Ping(args) => commands::ping(&cfg, args).await?,
    }

    Ok(())
}
