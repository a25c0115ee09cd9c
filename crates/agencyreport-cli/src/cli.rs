use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "agencyreport")]
#[command(about = "AgencyReport CLI: compile and run tenant reports")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (defaults to ./agencyreport.toml when present)
    #[arg(short, long, global = true, env = "AGENCYREPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (overrides logging.level; RUST_LOG wins over both)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a report definition and print the SQL and parameters
    Compile(CompileArgs),
    /// Run a report against a tenant's database
    Run(RunArgs),
    /// Check that a tenant's database is reachable
    Ping(PingArgs),
}

#[derive(Clone, Copy, ValueEnum, Default, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON array of row objects
    #[default]
    Json,
    /// One JSON object per line
    Ndjson,
    /// Comma-separated values with a header row
    Csv,
    /// Rounded table for terminals
    Table,
}

#[derive(clap::Args)]
pub struct CompileArgs {
    /// Path to the report JSON file ("-" reads stdin)
    #[arg(short, long)]
    pub report: String,
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Tenant (agency) identifier
    #[arg(short, long, env = "AGENCYREPORT_TENANT")]
    pub tenant: String,
    /// Path to the report JSON file ("-" reads stdin)
    #[arg(short, long)]
    pub report: String,
    /// Output format
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,
}

#[derive(clap::Args)]
pub struct PingArgs {
    /// Tenant (agency) identifier
    #[arg(short, long, env = "AGENCYREPORT_TENANT")]
    pub tenant: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "agencyreport",
            "--log-level",
            "debug",
            "run",
            "--tenant",
            "north",
            "--report",
            "report.json",
            "--format",
            "csv",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.tenant, "north");
                assert_eq!(args.report, "report.json");
                assert_eq!(args.format, OutputFormat::Csv);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_run_defaults_to_json() {
        let cli =
            Cli::try_parse_from(["agencyreport", "run", "-t", "north", "-r", "-"]).unwrap();
        match cli.command {
            Commands::Run(args) => assert_eq!(args.format, OutputFormat::Json),
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(
            Cli::try_parse_from(["agencyreport", "run", "-t", "n", "-r", "r.json", "-f", "pdf"])
                .is_err()
        );
    }
}
