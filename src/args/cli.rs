use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::time::Duration;

use super::parsers::{
    parse_duration_arg, parse_listen_addr, parse_positive_u64, parse_positive_usize,
};
use super::types::{DispatchStrategy, OutputFormat, PositiveU64, PositiveUsize};

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve `GET /loadtest?url=..&rps=..&duration=..` and answer with the run report
    Serve(ServeArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:9012", value_parser = parse_listen_addr)]
    pub listen: SocketAddr,

    /// Do not append run reports to a CSV file (serve defaults to ./metrics.csv)
    #[arg(long = "no-csv")]
    pub no_csv: bool,
}

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Rate-controlled async HTTP load generator with exact latency percentiles and per-status breakdowns.",
    next_help_heading = "Advanced Options"
)]
pub struct TesterArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Target URL (GET)
    #[arg(long, short, help_heading = "Common Options")]
    pub url: Option<String>,

    /// Requests per second
    #[arg(
        long = "rate",
        short = 'r',
        alias = "rps",
        value_parser = parse_positive_u64,
        help_heading = "Common Options"
    )]
    pub rate: Option<PositiveU64>,

    /// Duration of test (seconds)
    #[arg(
        long = "duration",
        short = 't',
        default_value = "10",
        value_parser = parse_positive_u64,
        help_heading = "Common Options"
    )]
    pub target_duration: PositiveU64,

    /// Per-request timeout (supports ms/s/m/h). Defaults to the test duration.
    #[arg(
        long = "timeout",
        global = true,
        value_parser = parse_duration_arg,
        help_heading = "Common Options"
    )]
    pub request_timeout: Option<Duration>,

    /// Timeout for establishing a new connection (supports ms/s/m/h)
    #[arg(
        long = "connect-timeout",
        global = true,
        default_value = "5s",
        value_parser = parse_duration_arg
    )]
    pub connect_timeout: Duration,

    /// Dispatch strategy: epoch bursts or paced workers
    #[arg(
        long,
        global = true,
        default_value = "epoch",
        value_enum,
        help_heading = "Common Options"
    )]
    pub strategy: DispatchStrategy,

    /// Worker pool size for the paced strategy (defaults to available parallelism)
    #[arg(long, global = true, value_parser = parse_positive_usize)]
    pub workers: Option<PositiveUsize>,

    /// Upper bound on concurrently running requests in epoch mode
    #[arg(long = "max-in-flight", global = true, value_parser = parse_positive_usize)]
    pub max_in_flight: Option<PositiveUsize>,

    /// How long in-flight requests may finish after a shutdown signal (supports ms/s/m/h)
    #[arg(
        long = "shutdown-grace",
        global = true,
        default_value = "5s",
        value_parser = parse_duration_arg
    )]
    pub shutdown_grace: Duration,

    /// Append the run report as a CSV row to this file
    #[arg(long, global = true)]
    pub csv: Option<String>,

    /// Write the run report as JSON to this file
    #[arg(long)]
    pub json: Option<String>,

    /// Stdout format for the run report
    #[arg(long = "output-format", default_value = "text", value_enum)]
    pub output_format: OutputFormat,

    /// Limit the number of redirects to follow (0 disables redirects)
    #[arg(long = "redirect", global = true, default_value = "10")]
    pub redirect_limit: u32,

    /// Disable keep-alive (prevents re-use of TCP connections)
    #[arg(long = "disable-keepalive", global = true)]
    pub disable_keepalive: bool,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Enable verbose logging (sets log level to debug unless overridden by LOADPULSE_LOG/RUST_LOG)
    #[arg(
        long,
        short = 'v',
        alias = "debug",
        global = true,
        help_heading = "Common Options"
    )]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Path to config file (TOML/JSON). Defaults to ./loadpulse.toml or ./loadpulse.json if present.
    #[arg(long, global = true, help_heading = "Common Options")]
    pub config: Option<String>,
}
