use std::sync::Arc;

use tokio::net::TcpStream;
use tracing::{debug, error, warn};
use url::form_urlencoded;

use crate::engine::TestParameters;
use crate::error::{AppResult, ValidationError};
use crate::shutdown::ShutdownSender;
use crate::sinks::append_csv_row;

use super::ServerState;
use super::http::{
    HttpRequest, ResponseError, read_http_request, write_error_response, write_json_response,
};

const LOAD_TEST_PATH: &str = "/loadtest";
const ALREADY_RUNNING: &str = "A load test is already running.";

pub(super) async fn handle_connection(
    mut socket: TcpStream,
    state: Arc<ServerState>,
    shutdown_tx: ShutdownSender,
) {
    let result = match read_http_request(&mut socket).await {
        Ok(request) => respond(&mut socket, &request, &state, &shutdown_tx).await,
        Err(err) => write_error_response(&mut socket, err.status, &err.message).await,
    };
    if let Err(err) = result {
        warn!("Failed to answer request: {}", err);
    }
}

async fn respond(
    socket: &mut TcpStream,
    request: &HttpRequest,
    state: &ServerState,
    shutdown_tx: &ShutdownSender,
) -> AppResult<()> {
    debug!(method = %request.method, target = %request.target, "Request received");
    if request.path() != LOAD_TEST_PATH {
        return write_error_response(socket, 404, "Not found").await;
    }
    if request.method != "GET" {
        return write_error_response(socket, 405, "Only GET is supported").await;
    }

    let params = match parse_query(request.query()) {
        Ok(params) => params,
        Err(err) => return write_error_response(socket, err.status, &err.message).await,
    };

    let Ok(_run_guard) = state.run_lock.try_lock() else {
        return write_error_response(socket, 409, ALREADY_RUNNING).await;
    };

    let report = match state.tester.run(&params, shutdown_tx).await {
        Ok(report) => report,
        Err(err) => {
            error!("Load test failed: {}", err);
            return write_error_response(socket, 500, &err.to_string()).await;
        }
    };

    if let Some(path) = state.csv_path.as_deref()
        && let Err(err) = append_csv_row(path, &report).await
    {
        error!("Failed to write CSV row: {}", err);
    }

    write_json_response(socket, 200, &report).await
}

/// Reads `url`, `rps` and `duration` from a query string.
fn parse_query(query: &str) -> Result<TestParameters, ResponseError> {
    let mut url = None;
    let mut rps = None;
    let mut duration = None;
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "url" => url = Some(value.into_owned()),
            "rps" => rps = Some(value.into_owned()),
            "duration" => duration = Some(value.into_owned()),
            _ => {}
        }
    }

    let url = url.ok_or_else(|| missing("url"))?;
    let rps = rps.ok_or_else(|| missing("rps"))?;
    let duration = duration.ok_or_else(|| missing("duration"))?;
    TestParameters::parse(&url, &rps, &duration)
        .map_err(|err| ResponseError::new(400, err.to_string()))
}

fn missing(name: &'static str) -> ResponseError {
    ResponseError::new(
        400,
        ValidationError::MissingParameter { name }.to_string(),
    )
}
