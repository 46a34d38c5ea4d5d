use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, warn};
use url::Url;

use crate::http::Transport;
use crate::shutdown::ShutdownReceiver;

use super::channel::OutcomeSender;
use super::{ErrorCounter, Outcome, TransportFailure};

/// Everything an executor borrows from the run that spawned it.
#[derive(Clone)]
pub(crate) struct ExecutorContext {
    pub transport: Arc<dyn Transport>,
    pub url: Arc<Url>,
    pub errors: Arc<ErrorCounter>,
    pub outcomes: OutcomeSender,
    pub request_timeout: Duration,
    pub shutdown_grace: Duration,
}

/// Performs one timed GET and sends exactly one [`Outcome`] to the result
/// channel.
///
/// The exchange is bounded by `request_timeout`. A panic raised by the
/// transport is caught here and reported as a failure. Once `shutdown_rx`
/// fires, the request may keep running for the grace period before it is
/// abandoned and reported as cancelled.
pub(crate) async fn execute(
    context: &ExecutorContext,
    worker_id: usize,
    shutdown_rx: &mut ShutdownReceiver,
) {
    let request_timeout = context.request_timeout;
    let grace = context.shutdown_grace;
    let start = Instant::now();
    let exchange = async {
        let guarded = AssertUnwindSafe(context.transport.get(&context.url)).catch_unwind();
        match timeout(request_timeout, guarded).await {
            Ok(Ok(result)) => result,
            Ok(Err(payload)) => Err(TransportFailure::Panicked(panic_message(payload.as_ref()))),
            Err(_elapsed) => Err(TransportFailure::Timeout(format!(
                "no response within {:?}",
                request_timeout
            ))),
        }
    };
    let drain_deadline = async {
        if let Err(RecvError::Closed) = shutdown_rx.recv().await {
            // Sender dropped without a shutdown; never cancel.
            std::future::pending::<()>().await;
        }
        sleep(grace).await;
    };

    let result = tokio::select! {
        result = exchange => result,
        () = drain_deadline => Err(TransportFailure::Cancelled),
    };
    let latency = start.elapsed();

    let outcome = match result {
        Ok(status_code) => Outcome::success(worker_id, latency, status_code),
        Err(failure) => {
            context.errors.increment();
            debug!(worker_id, error = %failure, "Request failed");
            Outcome::failure(worker_id, latency, failure)
        }
    };

    if context.outcomes.send(outcome).await.is_err() {
        warn!(worker_id, "Result channel closed before the outcome was delivered");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        return (*message).to_owned();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic payload".to_owned()
}
