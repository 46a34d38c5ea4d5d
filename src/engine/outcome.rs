use std::fmt;
use std::time::Duration;

/// Why a request attempt did not complete an HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    Timeout(String),
    Transport(String),
    Panicked(String),
    /// Still in flight when the shutdown grace period ran out.
    Cancelled,
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportFailure::Timeout(message) => write!(f, "timed out: {}", message),
            TransportFailure::Transport(message) => write!(f, "transport error: {}", message),
            TransportFailure::Panicked(message) => write!(f, "worker panicked: {}", message),
            TransportFailure::Cancelled => f.write_str("cancelled by shutdown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// A complete exchange; 4xx and 5xx codes land here too.
    Status(u16),
    Failed(TransportFailure),
}

/// Result of a single request attempt, sent once from an executor to the
/// aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Diagnostics only; aggregation ignores it.
    pub worker_id: usize,
    pub latency: Duration,
    pub status: OutcomeStatus,
}

impl Outcome {
    #[must_use]
    pub const fn success(worker_id: usize, latency: Duration, status_code: u16) -> Self {
        Self {
            worker_id,
            latency,
            status: OutcomeStatus::Status(status_code),
        }
    }

    #[must_use]
    pub const fn failure(worker_id: usize, latency: Duration, failure: TransportFailure) -> Self {
        Self {
            worker_id,
            latency,
            status: OutcomeStatus::Failed(failure),
        }
    }

    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self.status {
            OutcomeStatus::Status(code) => Some(code),
            OutcomeStatus::Failed(_) => None,
        }
    }
}
