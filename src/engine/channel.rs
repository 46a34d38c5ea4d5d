use tokio::sync::{Semaphore, mpsc};

use super::Outcome;

pub type OutcomeSender = mpsc::Sender<Outcome>;
pub type OutcomeReceiver = mpsc::Receiver<Outcome>;

/// Opens the result channel with one slot per planned request, so no
/// executor ever waits on a consumer that has not started draining.
///
/// Capacity is clamped to `1..=Semaphore::MAX_PERMITS`; parameter
/// validation keeps real totals far below the upper bound.
#[must_use]
pub fn result_channel(total_requests: u64) -> (OutcomeSender, OutcomeReceiver) {
    let capacity = usize::try_from(total_requests)
        .unwrap_or(usize::MAX)
        .clamp(1, Semaphore::MAX_PERMITS);
    mpsc::channel(capacity)
}
