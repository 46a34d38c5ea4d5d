use std::collections::BTreeMap;
use std::time::Duration;

use super::channel::OutcomeReceiver;
use super::percentile::LatencySample;
use super::{Outcome, OutcomeStatus};

/// Count, sum and extremes over a set of latencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyStats {
    count: u64,
    sum: Duration,
    min: Duration,
    max: Duration,
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self {
            count: 0,
            sum: Duration::ZERO,
            min: Duration::MAX,
            max: Duration::ZERO,
        }
    }
}

impl LatencyStats {
    pub fn record(&mut self, latency: Duration) {
        self.count = self.count.saturating_add(1);
        self.sum = self.sum.saturating_add(latency);
        self.min = self.min.min(latency);
        self.max = self.max.max(latency);
    }

    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub const fn sum(&self) -> Duration {
        self.sum
    }

    /// Smallest recorded latency, zero when nothing was recorded.
    #[must_use]
    pub const fn min(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.min
        }
    }

    #[must_use]
    pub const fn max(&self) -> Duration {
        self.max
    }

    /// `sum / count`, zero when nothing was recorded.
    #[must_use]
    pub fn average(&self) -> Duration {
        average_over(self.sum, self.count)
    }
}

/// Divides a latency sum by an attempt count in whole nanoseconds.
#[must_use]
pub fn average_over(sum: Duration, count: u64) -> Duration {
    let nanos = sum
        .as_nanos()
        .checked_div(u128::from(count))
        .unwrap_or(0);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Running totals of one run, owned by the single consuming task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunningAggregate {
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Successful requests only.
    pub latency: LatencyStats,
    pub status: BTreeMap<u16, LatencyStats>,
}

/// Single consumer of the result channel.
///
/// Every update is commutative, so the final aggregate does not depend on
/// the order in which outcomes arrive.
#[derive(Debug, Default)]
pub struct Aggregator {
    aggregate: RunningAggregate,
    sample: LatencySample,
}

impl Aggregator {
    #[must_use]
    pub fn with_capacity(expected: u64) -> Self {
        Self {
            aggregate: RunningAggregate::default(),
            sample: LatencySample::with_capacity(usize::try_from(expected).unwrap_or(0)),
        }
    }

    pub fn consume(&mut self, outcome: Outcome) {
        let aggregate = &mut self.aggregate;
        aggregate.attempted = aggregate.attempted.saturating_add(1);
        match outcome.status {
            OutcomeStatus::Status(code) => {
                aggregate.succeeded = aggregate.succeeded.saturating_add(1);
                aggregate.latency.record(outcome.latency);
                aggregate
                    .status
                    .entry(code)
                    .or_default()
                    .record(outcome.latency);
                self.sample.push(outcome.latency);
            }
            OutcomeStatus::Failed(_) => {
                aggregate.failed = aggregate.failed.saturating_add(1);
            }
        }
    }

    /// Drains `receiver` until every sender is gone.
    pub async fn drain(mut self, mut receiver: OutcomeReceiver) -> (RunningAggregate, LatencySample) {
        while let Some(outcome) = receiver.recv().await {
            self.consume(outcome);
        }
        self.finish()
    }

    #[must_use]
    pub fn finish(self) -> (RunningAggregate, LatencySample) {
        (self.aggregate, self.sample)
    }

    #[must_use]
    pub fn from_outcomes<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = Outcome>,
    {
        let mut aggregator = Self::default();
        for outcome in outcomes {
            aggregator.consume(outcome);
        }
        aggregator
    }
}
