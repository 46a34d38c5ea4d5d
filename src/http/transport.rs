use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::engine::TransportFailure;

use super::execution::drain_response_body;

/// One GET exchange against the target.
///
/// An `Ok` status means a complete exchange, whatever the code. `Err` is
/// reserved for exchanges that never completed. The caller bounds the call
/// with its own timeout.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<u16, TransportFailure>;
}

/// [`Transport`] backed by a pooled `reqwest` client. The response body is
/// drained so the connection returns to the pool and the measured latency
/// covers the whole exchange.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<u16, TransportFailure> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify)?;
        let status = response.status().as_u16();
        let bytes = drain_response_body(response).await.map_err(classify)?;
        debug!(status, bytes, "Request completed");
        Ok(status)
    }
}

fn classify(err: reqwest::Error) -> TransportFailure {
    if err.is_timeout() {
        TransportFailure::Timeout(err.to_string())
    } else {
        TransportFailure::Transport(err.to_string())
    }
}
