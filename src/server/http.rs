use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{AppError, AppResult, ServerError};

const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// A request line that could be parsed; headers are read and discarded.
pub(super) struct HttpRequest {
    pub(super) method: String,
    pub(super) target: String,
}

impl HttpRequest {
    pub(super) fn path(&self) -> &str {
        self.target
            .split_once('?')
            .map_or(self.target.as_str(), |(path, _)| path)
    }

    pub(super) fn query(&self) -> &str {
        self.target
            .split_once('?')
            .map_or("", |(_, query)| query)
    }
}

/// A request that is answered with an error status and `{"error": ...}`.
#[derive(Debug)]
pub(super) struct ResponseError {
    pub(super) status: u16,
    pub(super) message: String,
}

impl ResponseError {
    pub(super) fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

pub(super) async fn read_http_request(
    socket: &mut TcpStream,
) -> Result<HttpRequest, ResponseError> {
    let mut buffer: Vec<u8> = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    let header_end;

    loop {
        let bytes = socket
            .read(&mut chunk)
            .await
            .map_err(|err| ResponseError::new(400, format!("Failed to read request: {}", err)))?;
        if bytes == 0 {
            return Err(ResponseError::new(400, "Empty request"));
        }
        let read_slice = chunk
            .get(..bytes)
            .ok_or_else(|| ResponseError::new(400, "Invalid read length"))?;
        buffer.extend_from_slice(read_slice);
        if let Some(pos) = find_header_end(&buffer) {
            header_end = pos;
            break;
        }
        if buffer.len() > MAX_REQUEST_BYTES {
            return Err(ResponseError::new(413, "Request too large"));
        }
    }

    let header_bytes = buffer
        .get(..header_end)
        .ok_or_else(|| ResponseError::new(400, "Malformed request headers"))?;
    let header_text = std::str::from_utf8(header_bytes)
        .map_err(|err| ResponseError::new(400, format!("Invalid request encoding: {}", err)))?;
    let request_line = header_text
        .split("\r\n")
        .next()
        .ok_or_else(|| ResponseError::new(400, "Missing request line"))?;
    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| ResponseError::new(400, "Missing HTTP method"))?;
    let target = parts
        .next()
        .ok_or_else(|| ResponseError::new(400, "Missing request path"))?;

    Ok(HttpRequest {
        method: method.to_owned(),
        target: target.to_owned(),
    })
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

const fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

pub(super) async fn write_json_response<T>(
    socket: &mut TcpStream,
    status: u16,
    response: &T,
) -> AppResult<()>
where
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(response).map_err(|err| {
        AppError::server(ServerError::Serialize {
            context: "load test report",
            source: err,
        })
    })?;
    write_response(socket, status, &body).await
}

pub(super) async fn write_error_response(
    socket: &mut TcpStream,
    status: u16,
    message: &str,
) -> AppResult<()> {
    #[derive(Serialize)]
    struct ErrorResponse<'msg> {
        error: &'msg str,
    }
    let body = serde_json::to_vec(&ErrorResponse { error: message }).map_err(|err| {
        AppError::server(ServerError::Serialize {
            context: "error response",
            source: err,
        })
    })?;
    write_response(socket, status, &body).await
}

async fn write_response(socket: &mut TcpStream, status: u16, body: &[u8]) -> AppResult<()> {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        status_text(status),
        body.len()
    );
    socket.write_all(response.as_bytes()).await.map_err(|err| {
        AppError::server(ServerError::Io {
            context: "write response",
            source: err,
        })
    })?;
    socket.write_all(body).await.map_err(|err| {
        AppError::server(ServerError::Io {
            context: "write response body",
            source: err,
        })
    })?;
    socket.shutdown().await.map_err(|err| {
        AppError::server(ServerError::Io {
            context: "close connection",
            source: err,
        })
    })?;
    Ok(())
}
