use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::parsers::parse_listen_addr;
use crate::args::{Command, PositiveU64, PositiveUsize, TesterArgs};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::{ConfigFile, DurationValue, ServeConfig};

/// Applies configuration values to CLI arguments. A value given on the
/// command line always wins over the file.
///
/// # Errors
///
/// Returns an error when a config value is out of range or malformed.
pub fn apply_config(
    args: &mut TesterArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "url")
        && let Some(url) = config.url.clone()
    {
        args.url = Some(url);
    }

    if !is_cli(matches, "rate")
        && let Some(rate) = config.rate
    {
        args.rate = Some(ensure_positive_u64(rate, "rate")?);
    }

    if !is_cli(matches, "target_duration")
        && let Some(duration) = config.duration
    {
        args.target_duration = ensure_positive_u64(duration, "duration")?;
    }

    if !is_cli(matches, "request_timeout")
        && let Some(timeout) = config.timeout.as_ref()
    {
        args.request_timeout = Some(to_duration(timeout, "timeout")?);
    }

    if !is_cli(matches, "connect_timeout")
        && let Some(timeout) = config.connect_timeout.as_ref()
    {
        args.connect_timeout = to_duration(timeout, "connect_timeout")?;
    }

    if !is_cli(matches, "strategy")
        && let Some(strategy) = config.strategy
    {
        args.strategy = strategy;
    }

    if !is_cli(matches, "workers")
        && let Some(workers) = config.workers
    {
        args.workers = Some(ensure_positive_usize(workers, "workers")?);
    }

    if !is_cli(matches, "max_in_flight")
        && let Some(max_in_flight) = config.max_in_flight
    {
        args.max_in_flight = Some(ensure_positive_usize(max_in_flight, "max_in_flight")?);
    }

    if !is_cli(matches, "shutdown_grace")
        && let Some(grace) = config.shutdown_grace.as_ref()
    {
        args.shutdown_grace = to_duration(grace, "shutdown_grace")?;
    }

    if !is_cli(matches, "csv")
        && let Some(path) = config.csv.clone()
    {
        args.csv = Some(path);
    }

    if !is_cli(matches, "json")
        && let Some(path) = config.json.clone()
    {
        args.json = Some(path);
    }

    if !is_cli(matches, "output_format")
        && let Some(format) = config.output_format
    {
        args.output_format = format;
    }

    if !is_cli(matches, "redirect_limit")
        && let Some(limit) = config.redirect
    {
        args.redirect_limit = limit;
    }

    if !is_cli(matches, "disable_keepalive")
        && let Some(value) = config.disable_keepalive
    {
        args.disable_keepalive = value;
    }

    if !is_cli(matches, "insecure")
        && let Some(value) = config.insecure
    {
        args.insecure = value;
    }

    if !is_cli(matches, "no_color")
        && let Some(value) = config.no_color
    {
        args.no_color = value;
    }

    if let Some(Command::Serve(serve_args)) = args.command.as_mut()
        && let Some(serve_config) = config.serve.as_ref()
    {
        let serve_matches = matches.subcommand_matches("serve");
        apply_serve_config(serve_args, serve_matches, serve_config)?;
    }

    Ok(())
}

fn apply_serve_config(
    serve_args: &mut crate::args::ServeArgs,
    matches: Option<&ArgMatches>,
    config: &ServeConfig,
) -> AppResult<()> {
    let from_cli = |id: &str| matches.is_some_and(|matches| is_cli(matches, id));

    if !from_cli("listen")
        && let Some(listen) = config.listen.as_deref()
    {
        serve_args.listen = parse_listen_addr(listen)?;
    }

    if !from_cli("no_csv")
        && let Some(value) = config.no_csv
    {
        serve_args.no_csv = value;
    }

    Ok(())
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

fn ensure_positive_u64(value: u64, field: &'static str) -> AppResult<PositiveU64> {
    PositiveU64::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive { field, source: err })
    })
}

fn ensure_positive_usize(value: usize, field: &'static str) -> AppResult<PositiveUsize> {
    PositiveUsize::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive { field, source: err })
    })
}

fn to_duration(value: &DurationValue, field: &'static str) -> AppResult<std::time::Duration> {
    value
        .to_duration()
        .map_err(|err| AppError::config(ConfigError::InvalidField { field, source: err }))
}
