//! Core library for the `loadpulse` CLI.
//!
//! The [`engine`] drives rate-controlled GET requests against a target and
//! folds their outcomes into a [`engine::FinalReport`]. The remaining
//! modules supply what the binary needs around it: CLI argument types,
//! configuration files, the HTTP transport, report sinks and the
//! `/loadtest` endpoint served by `loadpulse serve`.
pub mod args;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod server;
pub mod shutdown;
pub mod sinks;
