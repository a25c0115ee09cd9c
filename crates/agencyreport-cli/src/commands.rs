use std::io::Read;
use std::sync::Arc;

use agencyreport_core::{QueryCompiler, ReportConfig};
use agencyreport_db_postgres::PgTenantRouter;
use agencyreport_runner::output::{CsvWriter, NdjsonWriter};
use agencyreport_runner::{OutputWriter, ReportRunner, TenantId};
use anyhow::{Context, Result};
use tracing::info;

use crate::cli::{OutputFormat, PingArgs, RunArgs};
use crate::config::AppConfig;
use crate::output::{print_json, print_success, print_table};

/// Reads a report definition from a file, or stdin when `source` is "-".
pub fn read_report(source: &str) -> Result<ReportConfig> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read report from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read report file {source}"))?
    };
    Ok(ReportConfig::from_json_str(&raw)?)
}

pub fn compile(cfg: &AppConfig, source: &str) -> Result<()> {
    let report = read_report(source)?;
    let query = QueryCompiler::with_options(cfg.compiler).compile(&report)?;
    print_json(&query)
}

pub async fn run(cfg: &AppConfig, args: &RunArgs) -> Result<()> {
    let report = read_report(&args.report)?;
    let tenant = TenantId::new(args.tenant.as_str())?;
    let router = Arc::new(make_router(cfg)?);
    let runner = ReportRunner::with_compiler(
        router.clone(),
        QueryCompiler::with_options(cfg.compiler),
    );

    let outcome = runner.run(&tenant, &report).await;
    router.close_all().await;
    let result = outcome?;
    info!(tenant = %tenant, rows = result.row_count, "Report completed");

    match args.format {
        OutputFormat::Json => print_json(&result.rows)?,
        OutputFormat::Ndjson => print!("{}", NdjsonWriter::new().write_to_string(&result)?),
        OutputFormat::Csv => print!("{}", CsvWriter::new().write_to_string(&result)?),
        OutputFormat::Table => print_table(&result),
    }
    Ok(())
}

pub async fn ping(cfg: &AppConfig, args: &PingArgs) -> Result<()> {
    let tenant = TenantId::new(args.tenant.as_str())?;
    let router = make_router(cfg)?;

    let outcome = router.ping(&tenant).await;
    router.close_all().await;
    outcome.with_context(|| format!("Tenant {tenant} is unreachable"))?;

    print_success(&format!("Tenant {tenant} is reachable"));
    Ok(())
}

fn make_router(cfg: &AppConfig) -> Result<PgTenantRouter> {
    PgTenantRouter::new(cfg.postgres.clone(), cfg.tenants.clone())
        .context("Invalid database configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_report_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"tables": ["projects"], "columns": [{{"table": "projects", "column": "id"}}], "limit": 5}}"#
        )
        .unwrap();

        let report = read_report(file.path().to_str().unwrap()).unwrap();
        assert_eq!(report.tables, vec!["projects"]);
        assert_eq!(report.columns.len(), 1);
    }

    #[test]
    fn test_read_report_errors_carry_context() {
        let err = read_report("/definitely/not/here.json").unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read report file"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(read_report(file.path().to_str().unwrap()).is_err());
    }
}
