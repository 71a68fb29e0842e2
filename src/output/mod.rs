//! Report structures and formatters

pub mod formatter;
pub mod report;

pub use formatter::{ReportGenerator, OutputFormatter};
pub use report::{MatchReport, RankedMatch, ReportMetadata};
