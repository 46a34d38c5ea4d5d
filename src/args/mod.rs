//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;


pub use cli::{Command, ServeArgs, TesterArgs};
pub use types::{DispatchStrategy, OutputFormat, PositiveU64, PositiveUsize};

pub use defaults::{DEFAULT_CSV_PATH, DEFAULT_SHUTDOWN_GRACE, DEFAULT_USER_AGENT};
