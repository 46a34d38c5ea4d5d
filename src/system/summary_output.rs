use loadpulse::args::OutputFormat;
use loadpulse::engine::FinalReport;
use loadpulse::error::AppResult;
use loadpulse::sinks::{report_json, summary_text};

/// Prints the report to stdout in the selected format.
pub(crate) fn print_report(report: &FinalReport, format: OutputFormat) -> AppResult<()> {
    match format {
        OutputFormat::Text => print!("{}", summary_text(report)?),
        OutputFormat::Json => println!("{}", report_json(report)?),
        OutputFormat::Quiet => {}
    }
    Ok(())
}
