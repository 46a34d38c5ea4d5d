//! Load-generation and metrics-aggregation engine.
//!
//! [`LoadTester::run`] validates nothing itself: callers build a
//! [`TestParameters`] first, which rejects zero rates, zero durations and
//! malformed URLs before any request is issued.
mod aggregator;
mod channel;
mod counter;
mod dispatcher;
mod executor;
mod format;
mod outcome;
mod params;
mod percentile;
mod report;
mod tester;


pub use aggregator::{Aggregator, LatencyStats, RunningAggregate};
pub use channel::{OutcomeReceiver, OutcomeSender, result_channel};
pub use counter::ErrorCounter;
pub use format::format_latency;
pub use outcome::{Outcome, OutcomeStatus, TransportFailure};
pub use params::{MAX_TOTAL_REQUESTS, TestParameters};
pub use percentile::{LatencySample, percentile};
pub use report::{FinalReport, StatusReport};
pub use tester::{LoadTester, LoadTesterConfig};
