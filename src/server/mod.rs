//! `GET /loadtest` endpoint that runs the engine on request.
//!
//! One [`LoadTester`] serves every connection and runs are serialized: a
//! request that arrives while a run is active is answered with `409`.
mod handler;
mod http;


use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::engine::LoadTester;
use crate::error::{AppError, AppResult, ServerError};
use crate::shutdown::ShutdownSender;

/// Extra time granted to open connections beyond the run's shutdown grace,
/// so a cancelled run can still write its partial report.
const CONNECTION_DRAIN_SLACK: Duration = Duration::from_secs(1);

pub struct ServerState {
    tester: LoadTester,
    run_lock: Mutex<()>,
    csv_path: Option<PathBuf>,
}

impl ServerState {
    /// `csv_path` receives one appended row per completed run.
    #[must_use]
    pub fn new(tester: LoadTester, csv_path: Option<PathBuf>) -> Self {
        Self {
            tester,
            run_lock: Mutex::new(()),
            csv_path,
        }
    }
}

/// Binds `listen` and serves until a shutdown is broadcast.
///
/// # Errors
///
/// Returns an error when the address cannot be bound.
pub async fn serve(
    listen: std::net::SocketAddr,
    state: Arc<ServerState>,
    shutdown_tx: &ShutdownSender,
) -> AppResult<()> {
    let listener = TcpListener::bind(listen).await.map_err(|err| {
        AppError::server(ServerError::Bind {
            addr: listen,
            source: err,
        })
    })?;
    serve_listener(listener, state, shutdown_tx).await
}

/// Accepts connections on an already bound listener until shutdown, then
/// waits for open connections to finish.
///
/// # Errors
///
/// Returns an error when the listener's address cannot be read.
pub async fn serve_listener(
    listener: TcpListener,
    state: Arc<ServerState>,
    shutdown_tx: &ShutdownSender,
) -> AppResult<()> {
    let local_addr = listener.local_addr().map_err(|err| {
        AppError::server(ServerError::Io {
            context: "read listener address",
            source: err,
        })
    })?;
    info!(addr = %local_addr, "Listening for load test requests");

    let mut shutdown_rx = shutdown_tx.subscribe();
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => match accepted {
                Ok((socket, peer)) => {
                    debug!(%peer, "Connection accepted");
                    connections.spawn(handler::handle_connection(
                        socket,
                        Arc::clone(&state),
                        shutdown_tx.clone(),
                    ));
                }
                Err(err) => warn!("{}", AppError::server(ServerError::Accept { source: err })),
            },
        }
        while connections.try_join_next().is_some() {}
    }
    drop(listener);

    let drain_limit = state
        .tester
        .config()
        .shutdown_grace
        .saturating_add(CONNECTION_DRAIN_SLACK);
    info!(
        open_connections = connections.len(),
        "Shutting down, waiting up to {:?}",
        drain_limit
    );
    let drained = tokio::time::timeout(drain_limit, async {
        while connections.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!("Closing connections that did not finish in time");
        connections.abort_all();
    }
    Ok(())
}
