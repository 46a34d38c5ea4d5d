use std::time::Duration;

use reqwest::{Client, redirect};
use tracing::error;

use crate::args::DEFAULT_USER_AGENT;
use crate::error::{AppError, AppResult, HttpError};

/// Connection settings shared read-only by every executor of a run. The
/// per-request timeout is applied per run by the transport.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub connect_timeout: Duration,
    pub redirect_limit: u32,
    pub disable_keepalive: bool,
    pub insecure: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            redirect_limit: 10,
            disable_keepalive: false,
            insecure: false,
        }
    }
}

/// Builds the pooled HTTP client.
///
/// # Errors
///
/// Returns an error when the TLS backend or client configuration cannot be
/// initialised.
pub fn build_client(settings: &ClientSettings) -> AppResult<Client> {
    let mut client_builder = Client::builder()
        .connect_timeout(settings.connect_timeout)
        .user_agent(DEFAULT_USER_AGENT);

    if settings.redirect_limit == 0 {
        client_builder = client_builder.redirect(redirect::Policy::none());
    } else {
        client_builder = client_builder.redirect(redirect::Policy::limited(
            usize::try_from(settings.redirect_limit).unwrap_or(10),
        ));
    }

    if settings.disable_keepalive {
        client_builder = client_builder
            .pool_max_idle_per_host(0)
            .pool_idle_timeout(Some(Duration::from_secs(0)));
    }

    if settings.insecure {
        client_builder = client_builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    }

    client_builder.build().map_err(|err| {
        error!("Failed to build HTTP client: {}", err);
        AppError::http(HttpError::BuildClientFailed { source: err })
    })
}
