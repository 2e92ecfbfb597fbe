//! SPF records (RFC 7208).
//!
//! Term-level parsing sits behind [`SpfGrammar`]; the classifier only sees
//! the resulting directives and does not care which grammar produced them.

mod classify;
mod parser;
mod types;

pub use classify::{
    classify, classify_directive, classify_spf, ClassifiedMechanism, ClassifiedSpf, MechanismKind,
};
pub use parser::SpfParser;
pub use types::{Directive, Mechanism, Qualifier, SpfParseError, SpfRecord};

/// RFC 7208 Section 4.6.4 ceiling on DNS-querying terms.
pub const MAX_DNS_LOOKUPS: usize = 10;

/// Turns SPF record text into directives and modifiers, rejecting anything
/// outside the grammar.
pub trait SpfGrammar {
    fn parse(&self, record: &str) -> Result<SpfRecord, SpfParseError>;
}
