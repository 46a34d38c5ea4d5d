use std::path::PathBuf;

use loadpulse::args::{Command, DEFAULT_CSV_PATH, DispatchStrategy, TesterArgs};
use loadpulse::engine::{LoadTesterConfig, TestParameters};
use loadpulse::error::{AppError, AppResult, ValidationError};
use loadpulse::http::ClientSettings;

use super::types::{LocalPlan, RunMode, RunPlan, ServePlan};

pub(in crate::entry) fn build_plan(mut args: TesterArgs) -> AppResult<RunPlan> {
    if args.workers.is_some() && args.strategy != DispatchStrategy::Paced {
        return Err(AppError::validation(ValidationError::WorkersRequirePaced));
    }

    let client = ClientSettings {
        connect_timeout: args.connect_timeout,
        redirect_limit: args.redirect_limit,
        disable_keepalive: args.disable_keepalive,
        insecure: args.insecure,
    };
    let tester = LoadTesterConfig {
        strategy: args.strategy,
        workers: args.workers.map(usize::from),
        max_in_flight: args.max_in_flight.map(usize::from),
        request_timeout: args.request_timeout,
        shutdown_grace: args.shutdown_grace,
    };

    let mode = match args.command.take() {
        Some(Command::Serve(serve)) => {
            let csv_path = if serve.no_csv {
                None
            } else {
                Some(PathBuf::from(
                    args.csv.as_deref().unwrap_or(DEFAULT_CSV_PATH),
                ))
            };
            RunMode::Serve(ServePlan {
                listen: serve.listen,
                csv_path,
            })
        }
        None => RunMode::Local(build_local_plan(&args)?),
    };

    Ok(RunPlan {
        client,
        tester,
        mode,
    })
}

fn build_local_plan(args: &TesterArgs) -> AppResult<LocalPlan> {
    let Some(url) = args.url.as_deref() else {
        tracing::error!("Missing URL (set --url or provide in config).");
        return Err(AppError::validation(ValidationError::MissingUrl));
    };
    let Some(rate) = args.rate else {
        tracing::error!("Missing request rate (set --rate or provide in config).");
        return Err(AppError::validation(ValidationError::MissingRate));
    };
    let params = TestParameters::new(url, rate.get(), args.target_duration.get())?;

    Ok(LocalPlan {
        params,
        csv_path: args.csv.as_deref().map(PathBuf::from),
        json_path: args.json.as_deref().map(PathBuf::from),
        output_format: args.output_format,
    })
}
