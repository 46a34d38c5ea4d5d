use super::*;
use crate::engine::TransportFailure;
use crate::error::{AppError, AppResult};
use std::future::Future;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::time::Duration;
use url::Url;

fn run_async_test<F>(future: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::validation(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(future)
}

/// Answers a single connection with `status` and a short body.
fn spawn_one_shot_server(status: &'static str) -> AppResult<Url> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buffer = [0u8; 1024];
            drop(stream.read(&mut buffer));
            let body = "hello";
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            drop(stream.write_all(response.as_bytes()));
        }
    });
    Url::parse(&format!("http://{}/", addr))
        .map_err(|err| AppError::validation(format!("Bad test url: {}", err)))
}

#[test]
fn build_client_accepts_default_settings() -> AppResult<()> {
    build_client(&ClientSettings::default())?;
    Ok(())
}

#[test]
fn build_client_accepts_all_options() -> AppResult<()> {
    let settings = ClientSettings {
        connect_timeout: Duration::from_millis(250),
        redirect_limit: 0,
        disable_keepalive: true,
        insecure: true,
    };
    build_client(&settings)?;
    Ok(())
}

#[test]
fn reqwest_transport_reports_error_statuses_as_completed() -> AppResult<()> {
    run_async_test(async {
        let url = spawn_one_shot_server("503 Service Unavailable")?;
        let transport = ReqwestTransport::new(build_client(&ClientSettings::default())?);
        match transport.get(&url).await {
            Ok(503) => Ok(()),
            other => Err(AppError::validation(format!("Expected 503, got {:?}", other))),
        }
    })
}

#[test]
fn reqwest_transport_reports_refused_connections_as_failures() -> AppResult<()> {
    run_async_test(async {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);
        let url = Url::parse(&format!("http://{}/", addr))
            .map_err(|err| AppError::validation(format!("Bad test url: {}", err)))?;

        let transport = ReqwestTransport::new(build_client(&ClientSettings::default())?);
        match transport.get(&url).await {
            Err(TransportFailure::Transport(_) | TransportFailure::Timeout(_)) => Ok(()),
            other => Err(AppError::validation(format!(
                "Expected transport failure, got {:?}",
                other
            ))),
        }
    })
}
