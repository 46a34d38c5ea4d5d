use std::sync::Arc;

use tracing::{error, warn};

use loadpulse::engine::LoadTester;
use loadpulse::error::AppResult;
use loadpulse::http::{ReqwestTransport, build_client};
use loadpulse::server::{ServerState, serve};
use loadpulse::shutdown::{ShutdownSender, shutdown_channel};
use loadpulse::sinks::{append_csv_row, write_json_report};

use crate::shutdown_handlers::setup_signal_shutdown_handler;
use crate::system::summary_output::print_report;

use super::types::{LocalPlan, RunMode, RunPlan, ServePlan};

pub(in crate::entry) async fn execute_plan(plan: RunPlan) -> AppResult<()> {
    let client = build_client(&plan.client)?;
    let tester = LoadTester::new(Arc::new(ReqwestTransport::new(client)), plan.tester);

    let (shutdown_tx, _) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    let result = match plan.mode {
        RunMode::Local(local) => run_local(&tester, local, &shutdown_tx).await,
        RunMode::Serve(serve_plan) => run_serve(tester, serve_plan, &shutdown_tx).await,
    };

    drop(shutdown_tx.send(()));
    if let Err(err) = signal_handle.await {
        warn!("Signal handler task failed: {}", err);
    }
    result
}

async fn run_local(
    tester: &LoadTester,
    plan: LocalPlan,
    shutdown_tx: &ShutdownSender,
) -> AppResult<()> {
    let report = tester.run(&plan.params, shutdown_tx).await?;
    print_report(&report, plan.output_format)?;

    if let Some(path) = plan.csv_path.as_deref()
        && let Err(err) = append_csv_row(path, &report).await
    {
        error!("Failed to write CSV report: {}", err);
        return Err(err);
    }
    if let Some(path) = plan.json_path.as_deref()
        && let Err(err) = write_json_report(path, &report).await
    {
        error!("Failed to write JSON report: {}", err);
        return Err(err);
    }
    Ok(())
}

async fn run_serve(
    tester: LoadTester,
    plan: ServePlan,
    shutdown_tx: &ShutdownSender,
) -> AppResult<()> {
    let state = Arc::new(ServerState::new(tester, plan.csv_path));
    serve(plan.listen, state, shutdown_tx).await
}
