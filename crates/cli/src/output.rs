//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use kusage_lib::threshold::utilization_percent;
use kusage_lib::{Report, ReportRow, ResourceQuantity};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};
use thiserror::Error;

/// Output format for the report
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Failure to render a report
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to serialize report as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shown for a container the metrics API did not report
pub const UNKNOWN: &str = "unknown";

/// Shown for a request or limit that is not configured
pub const NONE: &str = "none";

/// Row for the usage table
#[derive(Tabled)]
struct UsageRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Pod")]
    pod: String,
    #[tabled(rename = "Container")]
    container: String,
    #[tabled(rename = "Memory Used")]
    memory_used: String,
    #[tabled(rename = "Memory Requested")]
    memory_requested: String,
    #[tabled(rename = "Memory Limit")]
    memory_limit: String,
    #[tabled(rename = "CPU Used")]
    cpu_used: String,
    #[tabled(rename = "CPU Requested")]
    cpu_requested: String,
    #[tabled(rename = "CPU Limit")]
    cpu_limit: String,
}

impl From<&ReportRow> for UsageRow {
    fn from(row: &ReportRow) -> Self {
        Self {
            namespace: row.namespace.clone(),
            pod: row.pod.clone(),
            container: row.container.clone(),
            memory_used: color_usage(row.memory_used(), row.mem_high),
            memory_requested: format_setting(row.requests.memory.as_ref()),
            memory_limit: format_setting(row.limits.memory.as_ref()),
            cpu_used: color_usage(row.cpu_used(), row.cpu_high),
            cpu_requested: format_setting(row.requests.cpu.as_ref()),
            cpu_limit: format_setting(row.limits.cpu.as_ref()),
        }
    }
}

/// Row for JSON output, with usage as a share of the request
#[derive(Serialize)]
struct JsonRow<'a> {
    #[serde(flatten)]
    row: &'a ReportRow,
    memory_request_percent: Option<f64>,
    cpu_request_percent: Option<f64>,
}

impl<'a> From<&'a ReportRow> for JsonRow<'a> {
    fn from(row: &'a ReportRow) -> Self {
        Self {
            row,
            memory_request_percent: row
                .memory_used()
                .and_then(|used| utilization_percent(used, row.requests.memory.as_ref())),
            cpu_request_percent: row
                .cpu_used()
                .and_then(|used| utilization_percent(used, row.requests.cpu.as_ref())),
        }
    }
}

/// Print the report rows followed by any issues encountered
pub fn print_report(report: &Report, format: OutputFormat) -> Result<(), RenderError> {
    match format {
        OutputFormat::Table => {
            if report.rows.is_empty() {
                print_warning("No containers found");
            } else {
                println!("{}", render_table(&report.rows));
            }
        }
        OutputFormat::Json => {
            println!("{}", render_json(&report.rows)?);
        }
    }

    for issue in &report.issues {
        print_warning(&issue.to_string());
    }

    Ok(())
}

/// Render rows as a table
pub fn render_table(rows: &[ReportRow]) -> String {
    let rows: Vec<UsageRow> = rows.iter().map(UsageRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Render rows as pretty JSON
pub fn render_json(rows: &[ReportRow]) -> Result<String, RenderError> {
    let rows: Vec<JsonRow> = rows.iter().map(JsonRow::from).collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Format a configured request or limit
pub fn format_setting(quantity: Option<&ResourceQuantity>) -> String {
    quantity.map_or_else(|| NONE.to_string(), ToString::to_string)
}

/// Color observed usage: red when below the threshold share of its request
pub fn color_usage(quantity: Option<&ResourceQuantity>, flagged: bool) -> String {
    match quantity {
        None => UNKNOWN.to_string(),
        Some(q) if flagged => q.to_string().red().to_string(),
        Some(q) => q.to_string().green().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kusage_lib::{ContainerUsage, ResourcePair};

    fn row(usage: Option<ContainerUsage>, mem_high: bool) -> ReportRow {
        ReportRow {
            namespace: "default".to_string(),
            pod: "web-0".to_string(),
            container: "app".to_string(),
            usage,
            requests: ResourcePair {
                memory: Some(ResourceQuantity::mebibytes(100.0)),
                cpu: None,
            },
            limits: ResourcePair::default(),
            mem_high,
            cpu_high: false,
        }
    }

    #[test]
    fn test_table_has_all_columns() {
        let usage = ContainerUsage {
            cpu: Some(ResourceQuantity::millicores(5.0)),
            memory: Some(ResourceQuantity::mebibytes(10.0)),
        };

        let table = render_table(&[row(Some(usage), true)]);
        for column in [
            "Namespace",
            "Pod",
            "Container",
            "Memory Used",
            "Memory Requested",
            "Memory Limit",
            "CPU Used",
            "CPU Requested",
            "CPU Limit",
        ] {
            assert!(table.contains(column), "missing column {}", column);
        }
        assert!(table.contains("10Mi"));
        assert!(table.contains("100Mi"));
        assert!(table.contains("5m"));
    }

    #[test]
    fn test_unknown_usage_and_unset_settings() {
        let table_row = UsageRow::from(&row(None, false));
        assert_eq!(table_row.memory_used, UNKNOWN);
        assert_eq!(table_row.cpu_used, UNKNOWN);
        assert_eq!(table_row.cpu_requested, NONE);
        assert_eq!(table_row.memory_limit, NONE);
    }

    #[test]
    fn test_flagged_usage_is_red() {
        colored::control::set_override(true);
        let cell = color_usage(Some(&ResourceQuantity::mebibytes(10.0)), true);
        assert_eq!(cell, "10Mi".red().to_string());
        colored::control::unset_override();
    }

    #[test]
    fn test_json_output() {
        let usage = ContainerUsage {
            cpu: None,
            memory: Some(ResourceQuantity::mebibytes(10.0)),
        };

        let json = render_json(&[row(Some(usage), true)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["pod"], "web-0");
        assert_eq!(value[0]["mem_high"], true);
        assert_eq!(value[0]["usage"]["memory"]["value"], 10.0);
        assert_eq!(value[0]["usage"]["memory"]["unit"], "memory");
        assert!(value[0]["requests"]["cpu"].is_null());
        assert_eq!(value[0]["memory_request_percent"], 10.0);
        assert!(value[0]["cpu_request_percent"].is_null());
    }
}
