use url::Url;

use crate::args::PositiveU64;
use crate::error::ValidationError;

/// Largest request total a single run accepts. Bounded by the result
/// channel, which reserves one slot per request.
pub const MAX_TOTAL_REQUESTS: u64 = 1 << 40;

/// Validated inputs of one load-test run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestParameters {
    url: Url,
    rate: PositiveU64,
    duration: PositiveU64,
    total_requests: u64,
}

impl TestParameters {
    /// Validates a target URL, a rate (requests/second) and a duration
    /// (seconds).
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is not an absolute http(s) URL, when
    /// rate or duration is zero, or when `rate × duration` cannot be
    /// represented.
    pub fn new(url: &str, rate: u64, duration: u64) -> Result<Self, ValidationError> {
        let url = parse_target_url(url)?;
        let rate = PositiveU64::try_from(rate).map_err(|_err| ValidationError::RateZero)?;
        let duration =
            PositiveU64::try_from(duration).map_err(|_err| ValidationError::DurationZero)?;
        let total_requests = rate
            .get()
            .checked_mul(duration.get())
            .filter(|total| *total <= MAX_TOTAL_REQUESTS)
            .ok_or(ValidationError::TotalRequestsOverflow {
                rate: rate.get(),
                duration: duration.get(),
            })?;
        Ok(Self {
            url,
            rate,
            duration,
            total_requests,
        })
    }

    /// Parses the three parameters from their textual form, as received
    /// from a query string.
    ///
    /// # Errors
    ///
    /// Returns an error when either number is not a non-negative integer, or
    /// when [`TestParameters::new`] rejects the values.
    pub fn parse(url: &str, rate: &str, duration: &str) -> Result<Self, ValidationError> {
        let rate_value = parse_count("rps", rate)?;
        let duration_value = parse_count("duration", duration)?;
        Self::new(url, rate_value, duration_value)
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub const fn rate(&self) -> u64 {
        self.rate.get()
    }

    #[must_use]
    pub const fn duration_secs(&self) -> u64 {
        self.duration.get()
    }

    /// `rate × duration`: the number of requests the run attempts.
    #[must_use]
    pub const fn total_requests(&self) -> u64 {
        self.total_requests
    }
}

fn parse_count(field: &'static str, value: &str) -> Result<u64, ValidationError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|err| ValidationError::InvalidParameter {
            field,
            value: value.to_owned(),
            source: err,
        })
}

fn parse_target_url(raw: &str) -> Result<Url, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingUrl);
    }
    let url = Url::parse(trimmed).map_err(|err| ValidationError::InvalidUrl {
        url: trimmed.to_owned(),
        source: err,
    })?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ValidationError::UnsupportedScheme {
                scheme: other.to_owned(),
            });
        }
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError::UrlMissingHost);
    }
    Ok(url)
}
