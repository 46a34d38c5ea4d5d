use std::path::Path;

use tokio::io::{AsyncWriteExt, BufWriter};

use crate::engine::FinalReport;
use crate::error::{AppError, AppResult, SinkError};

/// Pretty-printed JSON document of a report.
///
/// # Errors
///
/// Returns an error when serialization fails.
pub fn report_json(report: &FinalReport) -> AppResult<String> {
    serde_json::to_string_pretty(report)
        .map_err(|err| AppError::sink(SinkError::SerializeReport { source: err }))
}

/// Writes the report to `path`, replacing any previous content.
///
/// # Errors
///
/// Returns an error when serialization or the write fails.
pub async fn write_json_report(path: &Path, report: &FinalReport) -> AppResult<()> {
    let json = report_json(report)?;
    let to_sink_error = |err: std::io::Error| {
        AppError::sink(SinkError::WriteJson {
            path: path.to_path_buf(),
            source: err,
        })
    };

    let file = tokio::fs::File::create(path).await.map_err(to_sink_error)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(json.as_bytes()).await.map_err(to_sink_error)?;
    writer.write_all(b"\n").await.map_err(to_sink_error)?;
    writer.flush().await.map_err(to_sink_error)?;
    Ok(())
}
