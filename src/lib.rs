//! Email authentication record validation: DKIM keys, SPF and DMARC policies.
//!
//! Records are supplied as TXT text. Nothing here performs DNS resolution;
//! the goal is to catch malformed records before they are published.

pub mod common;
pub mod dkim;
pub mod dmarc;
pub mod spf;
pub mod validate;

pub use dkim::{parse_dkim, DkimErrorKind, DkimKeyRecord, DkimParseError, KeyType};
pub use dmarc::{DmarcGrammar, DmarcParser, DmarcRecord, DmarcSummary};
pub use spf::{
    classify_spf, ClassifiedMechanism, ClassifiedSpf, MechanismKind, SpfGrammar, SpfParser,
};
pub use validate::{LookupLimitPolicy, RecordKind, ValidationError, Validator, ValidatorConfig};
