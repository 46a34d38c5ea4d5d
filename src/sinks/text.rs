use crate::engine::{FinalReport, format_latency};
use crate::error::AppResult;

use super::format::write_line;

/// Human-readable summary of a report.
///
/// # Errors
///
/// Returns an error when the summary cannot be formatted.
pub fn summary_text(report: &FinalReport) -> AppResult<String> {
    let mut output = String::new();
    write_line(&mut output, &format!("Target:          {}", report.url))?;
    write_line(
        &mut output,
        &format!(
            "Requests:        {} ({} planned, {} failed)",
            report.total_requests, report.planned_requests, report.failed_requests
        ),
    )?;
    write_line(
        &mut output,
        &format!("Rate:            {} req/s", report.requests_per_second),
    )?;
    write_line(
        &mut output,
        &format!("Error rate:      {:.2}%", report.error_rate),
    )?;
    write_line(
        &mut output,
        &format!(
            "Latency:         avg {} | min {} | max {}",
            format_latency(report.average_latency),
            format_latency(report.min_latency),
            format_latency(report.max_latency)
        ),
    )?;
    write_line(
        &mut output,
        &format!(
            "Percentiles:     p50 {} | p90 {} | p95 {} | p99 {}",
            format_latency(report.p50),
            format_latency(report.p90),
            format_latency(report.p95),
            format_latency(report.p99)
        ),
    )?;

    if !report.status_metrics.is_empty() {
        write_line(&mut output, "Status codes:")?;
        for (code, status) in &report.status_metrics {
            write_line(
                &mut output,
                &format!(
                    "  {}: {} requests, avg {}, min {}, max {}",
                    code,
                    status.count,
                    format_latency(status.avg_latency),
                    format_latency(status.min_latency),
                    format_latency(status.max_latency)
                ),
            )?;
        }
    }

    if report.interrupted {
        write_line(&mut output, "Run interrupted by shutdown; results are partial.")?;
    }
    Ok(output)
}
