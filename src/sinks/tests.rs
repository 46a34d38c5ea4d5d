use super::*;
use crate::engine::{Aggregator, FinalReport, Outcome, TestParameters, TransportFailure};
use crate::error::{AppError, AppResult};
use std::future::Future;
use std::time::Duration;
use tempfile::tempdir;

fn run_async_test<F>(future: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::sink(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(future)
}

fn sample_report(url: &str) -> AppResult<FinalReport> {
    let params = TestParameters::new(url, 2, 2)?;
    let outcomes = vec![
        Outcome::success(0, Duration::from_millis(10), 200),
        Outcome::success(1, Duration::from_millis(30), 200),
        Outcome::success(2, Duration::from_micros(1_500), 404),
        Outcome::failure(
            3,
            Duration::from_millis(2),
            TransportFailure::Timeout("deadline".to_owned()),
        ),
    ];
    let (aggregate, sample) = Aggregator::from_outcomes(outcomes).finish();
    Ok(FinalReport::build(&params, &aggregate, sample, false))
}

#[test]
fn csv_row_lists_summary_statuses_and_percentiles() -> AppResult<()> {
    let report = sample_report("http://localhost:8080/books")?;
    let row = csv_row(&report);
    let expected = "http://localhost:8080/books,4,10.375ms,2,1.5ms,30ms,25.00,\
200,2,10ms,30ms,20ms,\
404,1,1.5ms,1.5ms,1.5ms,\
10ms,26ms,28ms,29.6ms";
    if row != expected {
        return Err(AppError::sink(format!("Unexpected row: {}", row)));
    }
    Ok(())
}

#[test]
fn csv_row_quotes_urls_with_commas() -> AppResult<()> {
    let report = sample_report("http://localhost/search?q=a,b")?;
    let row = csv_row(&report);
    if !row.starts_with("\"http://localhost/search?q=a,b\",") {
        return Err(AppError::sink(format!("URL not quoted: {}", row)));
    }
    Ok(())
}

#[test]
fn append_csv_row_appends_and_creates_parents() -> AppResult<()> {
    run_async_test(async {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("metrics.csv");
        let report = sample_report("http://localhost/")?;

        append_csv_row(&path, &report).await?;
        append_csv_row(&path, &report).await?;

        let content = tokio::fs::read_to_string(&path).await?;
        let lines: Vec<&str> = content.lines().collect();
        if lines.len() != 2 {
            return Err(AppError::sink(format!("Expected 2 rows, got {}", lines.len())));
        }
        if lines.first() != lines.get(1) {
            return Err(AppError::sink("Rows should be identical"));
        }
        Ok(())
    })
}

#[test]
fn write_json_report_round_trips_fields() -> AppResult<()> {
    run_async_test(async {
        let dir = tempdir()?;
        let path = dir.path().join("report.json");
        let report = sample_report("http://localhost/")?;

        write_json_report(&path, &report).await?;

        let content = tokio::fs::read_to_string(&path).await?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        if value.get("total_requests").and_then(serde_json::Value::as_u64) != Some(4) {
            return Err(AppError::sink(format!("Unexpected JSON: {}", value)));
        }
        if value.get("p99").and_then(serde_json::Value::as_str) != Some("29.6ms") {
            return Err(AppError::sink(format!("Unexpected p99 in {}", value)));
        }
        if value.get("error_rate").and_then(serde_json::Value::as_f64) != Some(25.0) {
            return Err(AppError::sink(format!("Unexpected error_rate in {}", value)));
        }
        Ok(())
    })
}

#[test]
fn summary_text_mentions_each_status() -> AppResult<()> {
    let report = sample_report("http://localhost/")?;
    let text = summary_text(&report)?;
    for needle in ["200: 2 requests", "404: 1 requests", "Error rate:      25.00%"] {
        if !text.contains(needle) {
            return Err(AppError::sink(format!("Missing '{}' in:\n{}", needle, text)));
        }
    }
    Ok(())
}
