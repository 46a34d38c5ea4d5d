use std::time::Duration;

/// Successful latencies of one run, sorted lazily on first query.
#[derive(Debug, Default, Clone)]
pub struct LatencySample {
    values: Vec<Duration>,
    sorted: bool,
}

impl LatencySample {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            sorted: true,
        }
    }

    pub fn push(&mut self, latency: Duration) {
        if self.sorted
            && let Some(last) = self.values.last()
        {
            self.sorted = *last <= latency;
        }
        self.values.push(latency);
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sorts the sample once and answers the `p`-th percentile.
    pub fn percentile(&mut self, p: u64) -> Duration {
        if !self.sorted {
            self.values.sort_unstable();
            self.sorted = true;
        }
        percentile(&self.values, p)
    }
}

/// Linear-interpolation percentile over an ascending slice.
///
/// The rank is `p × (n − 1) / 100`; its fractional part weights the step to
/// the next value. Interpolation runs in whole nanoseconds, so the result is
/// exact up to truncation of the last nanosecond. `p` above 100 is clamped
/// and an empty slice yields [`Duration::ZERO`].
#[must_use]
pub fn percentile(sorted: &[Duration], p: u64) -> Duration {
    let Some(last_index) = sorted.len().checked_sub(1) else {
        return Duration::ZERO;
    };
    let p = u128::from(p.min(100));
    let scaled = p.saturating_mul(u128::try_from(last_index).unwrap_or(u128::MAX));
    let index = scaled.checked_div(100).unwrap_or(0);
    let fraction = scaled.checked_rem(100).unwrap_or(0);

    let lower_index = usize::try_from(index).unwrap_or(last_index);
    let Some(lower) = sorted.get(lower_index) else {
        return Duration::ZERO;
    };
    let upper = sorted.get(lower_index.saturating_add(1)).unwrap_or(lower);

    let lower_nanos = lower.as_nanos();
    let step = upper.as_nanos().saturating_sub(lower_nanos);
    let offset = step
        .saturating_mul(fraction)
        .checked_div(100)
        .unwrap_or(0);
    let nanos = lower_nanos.saturating_add(offset);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}
