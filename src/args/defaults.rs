use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str =
    concat!("loadpulse/", env!("CARGO_PKG_VERSION"));

/// CSV file appended to by `serve` when no explicit `--csv` is given.
pub const DEFAULT_CSV_PATH: &str = "metrics.csv";

pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
