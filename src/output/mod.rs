mod report;

pub use report::{generate_report, TextFileReport};

use anyhow::Result;

/// Trait for report destinations
pub trait ReportSink {
    /// Persist the rendered report text
    fn write_report(&mut self, report: &str) -> Result<()>;

    /// Human-readable location, used in log messages
    fn location(&self) -> String;
}
