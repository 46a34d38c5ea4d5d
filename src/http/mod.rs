//! HTTP transport used by the request executor.
mod client;
mod execution;
mod transport;

#[cfg(test)]
mod tests;

pub use client::{ClientSettings, build_client};
pub use transport::{ReqwestTransport, Transport};
