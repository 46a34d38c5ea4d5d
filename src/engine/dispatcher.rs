use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

use crate::args::DispatchStrategy;
use crate::shutdown::{ShutdownReceiver, ShutdownSender};

use super::TestParameters;
use super::executor::{ExecutorContext, execute};

const EPOCH: Duration = Duration::from_secs(1);
const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Resolved scheduling settings for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DispatchPlan {
    pub strategy: DispatchStrategy,
    /// Paced pool size before it is capped at the rate.
    pub workers: usize,
    /// Epoch-mode bound on concurrently running executors.
    pub max_in_flight: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DispatchSummary {
    pub launched: u64,
    pub interrupted: bool,
}

#[derive(Debug, Clone, Copy)]
struct WorkerReport {
    launched: u64,
    interrupted: bool,
}

/// Launches the run's executors on the planned schedule and waits until
/// every one of them has terminated.
///
/// `context` holds the dispatcher's own result sender. It is dropped only
/// after the last task has been joined, so the aggregator cannot observe a
/// closed channel while an executor may still send.
pub(crate) async fn dispatch(
    params: &TestParameters,
    plan: DispatchPlan,
    context: ExecutorContext,
    shutdown_tx: &ShutdownSender,
) -> DispatchSummary {
    let summary = match plan.strategy {
        DispatchStrategy::Epoch => {
            dispatch_epochs(params, plan.max_in_flight, &context, shutdown_tx).await
        }
        DispatchStrategy::Paced => {
            dispatch_paced(params, plan.workers, &context, shutdown_tx).await
        }
    };
    drop(context);
    summary
}

async fn dispatch_epochs(
    params: &TestParameters,
    max_in_flight: usize,
    context: &ExecutorContext,
    shutdown_tx: &ShutdownSender,
) -> DispatchSummary {
    let mut shutdown_rx = shutdown_tx.subscribe();
    let permits = Arc::new(Semaphore::new(
        max_in_flight.clamp(1, Semaphore::MAX_PERMITS),
    ));
    let mut tasks = JoinSet::new();
    let mut ticker = interval(EPOCH);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut launched: u64 = 0;
    let mut next_worker_id: usize = 0;
    let mut interrupted = false;

    'epochs: for epoch in 0..params.duration_secs() {
        // The first tick completes immediately; later ticks mark the
        // one-second boundaries measured from the start of the run.
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                interrupted = true;
                break 'epochs;
            }
            _ = ticker.tick() => {}
        }

        for _ in 0..params.rate() {
            // Subscribed before the shutdown check so a signal sent after the
            // check still reaches the executor.
            let mut exec_shutdown_rx = shutdown_tx.subscribe();
            let permit = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    interrupted = true;
                    break 'epochs;
                }
                permit = Arc::clone(&permits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_closed) => break 'epochs,
                },
            };

            let task_context = context.clone();
            let worker_id = next_worker_id;
            tasks.spawn(async move {
                execute(&task_context, worker_id, &mut exec_shutdown_rx).await;
                drop(permit);
            });
            next_worker_id = next_worker_id.wrapping_add(1);
            launched = launched.saturating_add(1);
        }

        while let Some(result) = tasks.try_join_next() {
            log_join_error(result);
        }
        debug!(
            epoch,
            launched,
            in_flight = tasks.len(),
            errors = context.errors.get(),
            "Epoch dispatched"
        );
    }

    if interrupted {
        info!(launched, "Shutdown requested, waiting for in-flight requests");
    }
    while let Some(result) = tasks.join_next().await {
        log_join_error(result);
    }

    DispatchSummary {
        launched,
        interrupted,
    }
}

async fn dispatch_paced(
    params: &TestParameters,
    workers: usize,
    context: &ExecutorContext,
    shutdown_tx: &ShutdownSender,
) -> DispatchSummary {
    let rate = params.rate();
    let worker_count = u64::try_from(workers)
        .unwrap_or(u64::MAX)
        .clamp(1, rate);
    let base_rate = rate.checked_div(worker_count).unwrap_or(rate);
    let extra = rate.checked_rem(worker_count).unwrap_or(0);

    let mut tasks = JoinSet::new();
    for index in 0..worker_count {
        let per_second = if index < extra {
            base_rate.saturating_add(1)
        } else {
            base_rate
        };
        let quota = per_second.saturating_mul(params.duration_secs());
        let worker_id = usize::try_from(index).unwrap_or(usize::MAX);
        let worker_context = context.clone();
        let pacing_rx = shutdown_tx.subscribe();
        let exec_rx = shutdown_tx.subscribe();
        tasks.spawn(paced_worker(
            worker_id,
            per_second,
            quota,
            worker_context,
            pacing_rx,
            exec_rx,
        ));
    }
    info!(workers = worker_count, rate, "Paced workers started");

    let mut summary = DispatchSummary {
        launched: 0,
        interrupted: false,
    };
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(report) => {
                summary.launched = summary.launched.saturating_add(report.launched);
                summary.interrupted |= report.interrupted;
            }
            Err(err) => error!("Paced worker failed: {}", err),
        }
    }
    summary
}

/// Issues `quota` requests one after another, spaced `1s / per_second`
/// apart. A request slower than the spacing delays the next tick rather
/// than overlapping with it.
async fn paced_worker(
    worker_id: usize,
    per_second: u64,
    quota: u64,
    context: ExecutorContext,
    mut pacing_rx: ShutdownReceiver,
    mut exec_rx: ShutdownReceiver,
) -> WorkerReport {
    let period_nanos = NANOS_PER_SEC
        .checked_div(per_second)
        .unwrap_or(NANOS_PER_SEC)
        .max(1);
    let mut ticker = interval(Duration::from_nanos(period_nanos));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut launched: u64 = 0;
    while launched < quota {
        tokio::select! {
            biased;
            _ = pacing_rx.recv() => {
                debug!(worker_id, launched, "Paced worker stopped by shutdown");
                return WorkerReport {
                    launched,
                    interrupted: true,
                };
            }
            _ = ticker.tick() => {}
        }
        execute(&context, worker_id, &mut exec_rx).await;
        launched = launched.saturating_add(1);
    }

    debug!(
        worker_id,
        launched,
        errors = context.errors.get(),
        "Paced worker finished"
    );
    WorkerReport {
        launched,
        interrupted: false,
    }
}

fn log_join_error<T>(result: Result<T, JoinError>) {
    if let Err(err) = result {
        error!("Executor task failed: {}", err);
    }
}
