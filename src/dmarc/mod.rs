//! DMARC (Domain-based Message Authentication, Reporting, and Conformance) per RFC 7489.

mod adapter;
mod parser;
mod types;

pub use adapter::{adapt, DmarcSummary};
pub use parser::{DmarcErrorKind, DmarcParseError, DmarcParser};
pub use types::{AlignmentMode, DmarcRecord, FailureOption, Policy, ReportFormat, ReportUri};

/// Turns DMARC record text into a fully validated [`DmarcRecord`].
pub trait DmarcGrammar {
    fn parse(&self, record: &str) -> Result<DmarcRecord, DmarcParseError>;
}
