use agencyreport_runner::ReportResult;
use colored::Colorize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

pub fn print_success(msg: &str) {
    eprintln!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_table(result: &ReportResult) {
    if result.is_empty() {
        println!("No rows.");
        return;
    }
    println!("{}", render_table(result));
    println!("Rows: {}", result.row_count);
}

fn render_table(result: &ReportResult) -> String {
    let mut builder = Builder::default();
    builder.push_record(result.columns.iter().map(String::as_str));
    for row in &result.rows {
        builder.push_record(
            result
                .columns
                .iter()
                .map(|c| row.get(c).map(cell).unwrap_or_default()),
        );
    }
    builder.build().with(Style::rounded()).to_string()
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
