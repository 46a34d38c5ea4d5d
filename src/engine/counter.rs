use std::sync::atomic::{AtomicU64, Ordering};

/// Transport-failure counter shared by the executors of a run.
///
/// The owning [`LoadTester`](super::LoadTester) resets it when a run starts,
/// so a count never leaks from one run into the next.
#[derive(Debug, Default)]
pub struct ErrorCounter {
    count: AtomicU64,
}

impl ErrorCounter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
        }
    }

    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
    }
}
