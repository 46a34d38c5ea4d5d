use std::path::Path;

use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::engine::{FinalReport, format_latency};
use crate::error::{AppError, AppResult, SinkError};

use super::format::csv_field;

/// One CSV record for a report, without the trailing newline.
///
/// Columns: url, total_requests, average_latency, requests_per_second,
/// min_latency, max_latency, error_rate; then status, count, min, max, avg
/// for every status code in ascending order; then p50, p90, p95, p99.
#[must_use]
pub fn csv_row(report: &FinalReport) -> String {
    let mut fields = vec![
        csv_field(&report.url),
        report.total_requests.to_string(),
        format_latency(report.average_latency),
        report.requests_per_second.to_string(),
        format_latency(report.min_latency),
        format_latency(report.max_latency),
        format!("{:.2}", report.error_rate),
    ];
    for (code, status) in &report.status_metrics {
        fields.push(code.to_string());
        fields.push(status.count.to_string());
        fields.push(format_latency(status.min_latency));
        fields.push(format_latency(status.max_latency));
        fields.push(format_latency(status.avg_latency));
    }
    for percentile in [report.p50, report.p90, report.p95, report.p99] {
        fields.push(format_latency(percentile));
    }
    fields.join(",")
}

/// Appends the report as one CSV row, creating the file and its parent
/// directories when they do not exist.
///
/// # Errors
///
/// Returns an error when the file cannot be opened or written.
pub async fn append_csv_row(path: &Path, report: &FinalReport) -> AppResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await.map_err(|err| {
            AppError::sink(SinkError::OpenCsv {
                path: path.to_path_buf(),
                source: err,
            })
        })?;
    }

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|err| {
            AppError::sink(SinkError::OpenCsv {
                path: path.to_path_buf(),
                source: err,
            })
        })?;

    let mut line = csv_row(report);
    line.push('\n');
    file.write_all(line.as_bytes()).await.map_err(|err| {
        AppError::sink(SinkError::WriteCsv {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    file.flush().await.map_err(|err| {
        AppError::sink(SinkError::WriteCsv {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    debug!(path = %path.display(), "Appended CSV row");
    Ok(())
}
