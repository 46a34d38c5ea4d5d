use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Serialize, Serializer};

use super::TestParameters;
use super::aggregator::{LatencyStats, RunningAggregate, average_over};
use super::format::format_latency;
use super::percentile::LatencySample;

/// Per-status-code slice of a [`FinalReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub count: u64,
    #[serde(serialize_with = "serialize_latency")]
    pub min_latency: Duration,
    #[serde(serialize_with = "serialize_latency")]
    pub max_latency: Duration,
    #[serde(serialize_with = "serialize_latency")]
    pub avg_latency: Duration,
}

impl From<&LatencyStats> for StatusReport {
    fn from(stats: &LatencyStats) -> Self {
        Self {
            count: stats.count(),
            min_latency: stats.min(),
            max_latency: stats.max(),
            avg_latency: stats.average(),
        }
    }
}

/// Summary of one completed (or interrupted) run.
///
/// `average_latency` divides the summed latency of successful requests by
/// every attempt, failed ones included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalReport {
    pub url: String,
    pub total_requests: u64,
    #[serde(serialize_with = "serialize_latency")]
    pub average_latency: Duration,
    /// The configured rate, not a measured throughput.
    pub requests_per_second: u64,
    #[serde(serialize_with = "serialize_latency")]
    pub min_latency: Duration,
    #[serde(serialize_with = "serialize_latency")]
    pub max_latency: Duration,
    /// Percentage of attempts that failed without an HTTP status.
    pub error_rate: f64,
    pub status_metrics: BTreeMap<u16, StatusReport>,
    #[serde(serialize_with = "serialize_latency")]
    pub p50: Duration,
    #[serde(serialize_with = "serialize_latency")]
    pub p90: Duration,
    #[serde(serialize_with = "serialize_latency")]
    pub p95: Duration,
    #[serde(serialize_with = "serialize_latency")]
    pub p99: Duration,
    #[serde(skip)]
    pub failed_requests: u64,
    #[serde(skip)]
    pub planned_requests: u64,
    #[serde(skip)]
    pub interrupted: bool,
}

impl FinalReport {
    #[must_use]
    pub fn build(
        params: &TestParameters,
        aggregate: &RunningAggregate,
        mut sample: LatencySample,
        interrupted: bool,
    ) -> Self {
        let status_metrics = aggregate
            .status
            .iter()
            .map(|(code, stats)| (*code, StatusReport::from(stats)))
            .collect();
        Self {
            url: params.url().to_string(),
            total_requests: aggregate.attempted,
            average_latency: average_over(aggregate.latency.sum(), aggregate.attempted),
            requests_per_second: params.rate(),
            min_latency: aggregate.latency.min(),
            max_latency: aggregate.latency.max(),
            error_rate: error_rate(aggregate.failed, aggregate.attempted),
            status_metrics,
            p50: sample.percentile(50),
            p90: sample.percentile(90),
            p95: sample.percentile(95),
            p99: sample.percentile(99),
            failed_requests: aggregate.failed,
            planned_requests: params.total_requests(),
            interrupted,
        }
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "error rate is reported as a floating-point percentage"
)]
fn error_rate(failed: u64, attempted: u64) -> f64 {
    if attempted == 0 {
        return 0.0;
    }
    (failed as f64 / attempted as f64) * 100.0
}

fn serialize_latency<S>(latency: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_latency(*latency))
}
