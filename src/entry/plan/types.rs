use std::net::SocketAddr;
use std::path::PathBuf;

use loadpulse::args::OutputFormat;
use loadpulse::engine::{LoadTesterConfig, TestParameters};
use loadpulse::http::ClientSettings;

pub(in crate::entry) struct LocalPlan {
    pub(super) params: TestParameters,
    pub(super) csv_path: Option<PathBuf>,
    pub(super) json_path: Option<PathBuf>,
    pub(super) output_format: OutputFormat,
}

pub(in crate::entry) struct ServePlan {
    pub(super) listen: SocketAddr,
    pub(super) csv_path: Option<PathBuf>,
}

pub(in crate::entry) enum RunMode {
    Local(LocalPlan),
    Serve(ServePlan),
}

pub(in crate::entry) struct RunPlan {
    pub(super) client: ClientSettings,
    pub(super) tester: LoadTesterConfig,
    pub(super) mode: RunMode,
}
