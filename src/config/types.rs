use std::time::Duration;

use serde::Deserialize;

use crate::args::parsers::parse_duration_value;
use crate::args::{DispatchStrategy, OutputFormat};
use crate::error::ValidationError;

/// Contents of `loadpulse.toml` / `loadpulse.json`. Every key is optional
/// and only fills in what the command line left unset.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub url: Option<String>,
    #[serde(alias = "rps")]
    pub rate: Option<u64>,
    pub duration: Option<u64>,
    pub timeout: Option<DurationValue>,
    pub connect_timeout: Option<DurationValue>,
    pub strategy: Option<DispatchStrategy>,
    pub workers: Option<usize>,
    pub max_in_flight: Option<usize>,
    pub shutdown_grace: Option<DurationValue>,
    pub csv: Option<String>,
    pub json: Option<String>,
    pub output_format: Option<OutputFormat>,
    pub redirect: Option<u32>,
    pub disable_keepalive: Option<bool>,
    pub insecure: Option<bool>,
    pub no_color: Option<bool>,
    pub serve: Option<ServeConfig>,
}

/// `[serve]` section, read only by the `serve` subcommand.
#[derive(Debug, Default, Deserialize)]
pub struct ServeConfig {
    pub listen: Option<String>,
    pub no_csv: Option<bool>,
}

/// Either a plain number of seconds or a string with a unit (`250ms`, `5s`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(0) => Err(ValidationError::DurationValueZero),
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => parse_duration_value(text),
        }
    }
}
