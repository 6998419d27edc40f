//! Reconciliation summary output.

use anyhow::Result;
use chrono::Utc;
use console::style;
use serde_json::{json, Map, Value};
use std::path::Path;

use crate::domain::{ReconcileReport, SummaryStatus};
use crate::tabular::value_to_cell;

pub const SUMMARY_SCHEMA_VERSION: &str = "1.0.0";

/// Plain-text report, one line per summary item.
pub fn render_summary_text(report: &ReconcileReport) -> String {
    let mut out = String::new();
    out.push_str(&report.headline());
    out.push('\n');

    for item in &report.items {
        let status = match item.status {
            SummaryStatus::Added => style(item.status.as_str()).green(),
            SummaryStatus::Updated => style(item.status.as_str()).yellow(),
        };
        out.push_str(&format!(
            "  {} {} ({} = {}): {}\n",
            status,
            item.id,
            item.key_field,
            value_to_cell(&item.key_value),
            item.fields.join(", ")
        ));
    }

    if report.unchanged > 0 {
        out.push_str(&format!("  unchanged: {}\n", report.unchanged));
    }
    if report.skipped_missing_key > 0 {
        out.push_str(&format!("  skipped (no key value): {}\n", report.skipped_missing_key));
    }
    for failure in &report.failures {
        out.push_str(&format!(
            "  {} row {} ({}): {}\n",
            style("failed").red(),
            failure.row + 1,
            value_to_cell(&failure.key_value),
            failure.message
        ));
    }
    out
}

/// JSON report with the summary items and run counters.
pub fn render_summary_json(
    report: &ReconcileReport,
    collection: &str,
    include_timestamp: bool,
) -> Result<String> {
    let mut doc = Map::new();
    doc.insert("schema_version".to_string(), Value::String(SUMMARY_SCHEMA_VERSION.to_string()));
    if include_timestamp {
        doc.insert(
            "generated_at".to_string(),
            Value::String(Utc::now().format("%Y-%m-%dT%H:%M:%S+00:00").to_string()),
        );
    }
    doc.insert("collection".to_string(), Value::String(collection.to_string()));
    doc.insert(
        "stats".to_string(),
        json!({
            "processed": report.processed,
            "added": report.added(),
            "updated": report.updated(),
            "unchanged": report.unchanged,
            "skipped_missing_key": report.skipped_missing_key,
            "failed": report.failures.len(),
        }),
    );
    doc.insert("items".to_string(), serde_json::to_value(&report.items)?);
    if !report.failures.is_empty() {
        doc.insert("failures".to_string(), serde_json::to_value(&report.failures)?);
    }
    Ok(serde_json::to_string_pretty(&Value::Object(doc))?)
}

pub fn write_summary(path: &Path, report: &ReconcileReport, collection: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_summary_json(report, collection, true)?)?;
    Ok(())
}
