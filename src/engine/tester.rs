use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread::available_parallelism;
use std::time::Duration;

use tracing::{info, warn};

use crate::args::{DEFAULT_SHUTDOWN_GRACE, DispatchStrategy};
use crate::error::AppResult;
use crate::http::Transport;
use crate::shutdown::ShutdownSender;

use super::aggregator::Aggregator;
use super::channel::result_channel;
use super::dispatcher::{DispatchPlan, dispatch};
use super::executor::ExecutorContext;
use super::{ErrorCounter, FinalReport, TestParameters};

/// Latencies preallocated per run; larger runs grow the sample as needed.
const SAMPLE_PREALLOCATION_LIMIT: u64 = 1 << 20;

/// Scheduling and cancellation settings shared by every run of a
/// [`LoadTester`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTesterConfig {
    pub strategy: DispatchStrategy,
    /// Paced pool size. Defaults to the available parallelism.
    pub workers: Option<usize>,
    /// Epoch-mode in-flight cap. Defaults to `rate × ceil(timeout)`.
    pub max_in_flight: Option<usize>,
    /// Per-request timeout. Defaults to the run duration.
    pub request_timeout: Option<Duration>,
    pub shutdown_grace: Duration,
}

impl Default for LoadTesterConfig {
    fn default() -> Self {
        Self {
            strategy: DispatchStrategy::default(),
            workers: None,
            max_in_flight: None,
            request_timeout: None,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

/// Runs load tests against a shared transport.
///
/// The tester owns the error counter of its runs. Runs on one tester are
/// expected to be serialized by the caller; the counter is reset whenever a
/// run starts.
pub struct LoadTester {
    transport: Arc<dyn Transport>,
    errors: Arc<ErrorCounter>,
    config: LoadTesterConfig,
}

impl LoadTester {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, config: LoadTesterConfig) -> Self {
        Self {
            transport,
            errors: Arc::new(ErrorCounter::new()),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &LoadTesterConfig {
        &self.config
    }

    /// Transport failures counted by the current or most recent run.
    #[must_use]
    pub fn errors(&self) -> u64 {
        self.errors.get()
    }

    #[must_use]
    pub fn request_timeout(&self, params: &TestParameters) -> Duration {
        self.config
            .request_timeout
            .unwrap_or_else(|| Duration::from_secs(params.duration_secs()))
    }

    pub(crate) fn plan(&self, params: &TestParameters) -> DispatchPlan {
        let workers = self.config.workers.unwrap_or_else(|| {
            available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        });
        let max_in_flight = self
            .config
            .max_in_flight
            .unwrap_or_else(|| default_max_in_flight(params.rate(), self.request_timeout(params)));
        DispatchPlan {
            strategy: self.config.strategy,
            workers,
            max_in_flight,
        }
    }

    /// Executes one run and returns its report.
    ///
    /// A shutdown broadcast on `shutdown_tx` stops the schedule early; the
    /// report then covers every request that was launched.
    ///
    /// # Errors
    ///
    /// Returns an error when the aggregator task fails to complete.
    pub async fn run(
        &self,
        params: &TestParameters,
        shutdown_tx: &ShutdownSender,
    ) -> AppResult<FinalReport> {
        self.errors.reset();
        let plan = self.plan(params);
        let request_timeout = self.request_timeout(params);
        info!(
            url = %params.url(),
            rate = params.rate(),
            duration_secs = params.duration_secs(),
            total_requests = params.total_requests(),
            strategy = ?plan.strategy,
            "Starting load test"
        );

        let (outcome_tx, outcome_rx) = result_channel(params.total_requests());
        let aggregator = Aggregator::with_capacity(
            params.total_requests().min(SAMPLE_PREALLOCATION_LIMIT),
        );
        let aggregator_handle = tokio::spawn(aggregator.drain(outcome_rx));

        let context = ExecutorContext {
            transport: Arc::clone(&self.transport),
            url: Arc::new(params.url().clone()),
            errors: Arc::clone(&self.errors),
            outcomes: outcome_tx,
            request_timeout,
            shutdown_grace: self.config.shutdown_grace,
        };
        let summary = dispatch(params, plan, context, shutdown_tx).await;
        let (aggregate, sample) = aggregator_handle.await?;

        let counted_errors = self.errors.get();
        if counted_errors != aggregate.failed {
            warn!(
                counted_errors,
                aggregated_failures = aggregate.failed,
                "Error counter disagrees with aggregated failures"
            );
        }
        if summary.launched != aggregate.attempted {
            warn!(
                launched = summary.launched,
                received = aggregate.attempted,
                "Some launched requests produced no outcome"
            );
        }

        let report = FinalReport::build(params, &aggregate, sample, summary.interrupted);
        info!(
            total_requests = report.total_requests,
            failed = report.failed_requests,
            interrupted = report.interrupted,
            "Load test finished"
        );
        Ok(report)
    }
}

fn default_max_in_flight(rate: u64, request_timeout: Duration) -> usize {
    let timeout_secs = request_timeout
        .as_secs()
        .saturating_add(u64::from(request_timeout.subsec_nanos() > 0))
        .max(1);
    usize::try_from(rate.saturating_mul(timeout_secs)).unwrap_or(usize::MAX)
}
