//! Report outputs: CSV rows, JSON documents and the text summary.
mod csv;
mod format;
mod json;
mod text;

#[cfg(test)]
mod tests;

pub use csv::{append_csv_row, csv_row};
pub use json::{report_json, write_json_report};
pub use text::summary_text;
