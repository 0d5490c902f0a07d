//! Clipboard text, CSV download and the standalone HTML report.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::NaiveDate;
use pricewatch_core::{
    format_delivery, format_price_change, format_saved_price, or_not_available, status_text,
    BatchStats, EnhancedStats, ItemStatus, ResultRecord, ResultRowView, NOT_AVAILABLE,
};

use crate::persist::{AtomicFileWriter, PersistError};

pub const TSV_HEADERS: [&str; 8] = [
    "#",
    "URL",
    "Your Price",
    "Current Price",
    "Price Change",
    "Availability",
    "Delivery",
    "Status",
];

pub const CSV_HEADERS: [&str; 9] = [
    "#",
    "URL",
    "Your Price",
    "Current Price",
    "Price Change",
    "Price Change %",
    "Availability",
    "Delivery Date",
    "Status",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Tsv,
    Csv,
    Html,
}

impl ExportFormat {
    pub fn filename(self, date: NaiveDate) -> String {
        let stem = format!("amazon-price-comparison-{}", date.format("%Y-%m-%d"));
        match self {
            Self::Tsv => format!("{stem}.tsv"),
            Self::Csv => format!("{stem}.csv"),
            Self::Html => format!("{stem}.html"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("nothing to export: the batch has no results")]
    Empty,
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Everything an export needs from a finished or partial batch.
#[derive(Debug, Clone, Copy)]
pub struct ExportInput<'a> {
    pub records: &'a [ResultRecord],
    pub stats: BatchStats,
    pub enhanced: EnhancedStats,
    /// Anchors the "(N days)" delivery distances.
    pub reference: NaiveDate,
    /// Date stamped into filenames and the report header.
    pub generated_on: NaiveDate,
}

/// Tab-separated table as copied to the clipboard.
pub fn clipboard_tsv(records: &[ResultRecord], reference: NaiveDate) -> String {
    let mut lines = vec![TSV_HEADERS.join("\t")];
    lines.extend(records.iter().enumerate().map(|(index, record)| {
        [
            (index + 1).to_string(),
            record.url.clone(),
            format_saved_price(record.saved_price),
            or_not_available(record.current_price.as_deref()),
            format_price_change(record.price_change, record.price_change_percent),
            or_not_available(record.availability.as_deref()),
            format_delivery(record.delivery_date, reference),
            status_text(record),
        ]
        .join("\t")
    }));
    lines.join("\n")
}

/// Every cell is quoted; embedded quotes are doubled.
pub fn csv_export(records: &[ResultRecord]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;
    for (index, record) in records.iter().enumerate() {
        writer.write_record([
            (index + 1).to_string(),
            record.url.clone(),
            money_or_na(record.saved_price),
            or_not_available(record.current_price.as_deref()),
            money_or_na(record.price_change),
            record
                .price_change_percent
                .filter(|percent| *percent != 0.0)
                .map(|percent| format!("{percent:.1}%"))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            or_not_available(record.availability.as_deref()),
            record
                .delivery_date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            status_text(record),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Csv(err.into_error().into()))?;
    // Every cell came from a `String`.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn money_or_na(value: Option<f64>) -> String {
    match value {
        Some(value) if value != 0.0 => format!("{value:.2}"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Self-contained report page with counters, the full table and a CSV download link.
pub fn html_report(input: &ExportInput<'_>) -> Result<String, ExportError> {
    let csv_name = ExportFormat::Csv.filename(input.generated_on);
    let csv_uri = format!(
        "data:text/csv;base64,{}",
        STANDARD.encode(csv_export(input.records)?)
    );

    let mut rows = String::new();
    for record in input.records {
        let row = ResultRowView::from_record(record, input.reference);
        let _ = write!(
            rows,
            "<tr><td>{}</td><td class=\"url-cell\"><a href=\"{url}\">{url}</a></td>\
             <td>{}</td><td>{}</td><td class=\"{}\">{}</td><td class=\"{}\">{}</td>\
             <td>{}</td><td class=\"status {}\">{}</td></tr>\n",
            row.index,
            escape(&row.your_price),
            escape(&row.current_price),
            row.price_trend.css_class(),
            escape(&row.price_change),
            row.stock.css_class(),
            escape(&row.availability),
            escape(&row.delivery),
            status_class(&row),
            escape(&row.status_text),
            url = escape(&row.url),
        );
    }

    let counters = [
        (input.stats.total, "Total Products"),
        (input.stats.success, "Successfully Processed"),
        (input.enhanced.price_increased, "Price Increased (15%+)"),
        (input.enhanced.out_of_stock, "Out of Stock"),
        (input.enhanced.late_delivery, "Late Delivery (10+ days)"),
        (input.enhanced.low_stock, "Low Stock (&lt;20)"),
    ];
    let mut stats = String::new();
    for (value, label) in counters {
        let _ = write!(
            stats,
            "<div class=\"stat-item\"><div class=\"stat-number\">{value}</div>\
             <div class=\"stat-label\">{label}</div></div>"
        );
    }

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Amazon Price Checker Results</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
.stats-grid {{ display: flex; gap: 1rem; flex-wrap: wrap; }}
.stat-item {{ border: 1px solid #ddd; padding: 0.5rem 1rem; }}
.stat-number {{ font-size: 1.5rem; font-weight: bold; }}
table {{ border-collapse: collapse; width: 100%; margin-top: 1rem; }}
th, td {{ border: 1px solid #ddd; padding: 0.25rem 0.5rem; text-align: left; }}
.increase, .out-of-stock, .error {{ color: #b00020; }}
.decrease, .in-stock, .success {{ color: #1b7f3b; }}
.limited, .blocked {{ color: #b26a00; }}
</style>
</head>
<body>
<h1>Amazon Price Checker Results</h1>
<p>Generated on {generated}</p>
<div class="stats-grid">{stats}</div>
<p><a download="{csv_name}" href="{csv_uri}">Download CSV</a></p>
<table class="results-table">
<thead><tr><th>#</th><th>Product URL</th><th>Your Price</th><th>Current Price</th><th>Price Change</th><th>Availability</th><th>Delivery Date</th><th>Status</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
</body>
</html>
"#,
        generated = input.generated_on.format("%Y-%m-%d"),
    ))
}

fn status_class(row: &ResultRowView) -> &'static str {
    match row.status {
        ItemStatus::Success => "success",
        ItemStatus::Blocked => "blocked",
        ItemStatus::Error => "error",
        ItemStatus::Pending | ItemStatus::Processing => "pending",
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render(format: ExportFormat, input: &ExportInput<'_>) -> Result<String, ExportError> {
    match format {
        ExportFormat::Tsv => Ok(clipboard_tsv(input.records, input.reference)),
        ExportFormat::Csv => csv_export(input.records),
        ExportFormat::Html => html_report(input),
    }
}

/// Renders `format` into `dir` under its dated filename.
pub fn write_export(
    dir: &Path,
    format: ExportFormat,
    input: &ExportInput<'_>,
) -> Result<PathBuf, ExportError> {
    if input.records.is_empty() {
        return Err(ExportError::Empty);
    }
    let writer = AtomicFileWriter::new(dir.to_path_buf());
    let path = writer.write(&format.filename(input.generated_on), &render(format, input)?)?;
    Ok(path)
}
