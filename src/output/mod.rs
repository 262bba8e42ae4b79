//! Report types and rendering

pub mod formatter;
pub mod report;

pub use formatter::{OutputFormat, ReportGenerator};
pub use report::AnalysisReport;
