//! DKIM public key records (RFC 6376 Section 3.6.1, RFC 8463).
//!
//! Validation is static: the key material is decoded and checked for
//! structure and strength, but no signature is ever verified.

mod crypto;
mod error;
mod key;
mod types;

pub use error::{DkimErrorKind, DkimParseError};
pub use types::{DkimKeyRecord, KeyType};

/// Parse and validate a DKIM key record (the concatenated TXT strings).
pub fn parse_dkim(txt_record: &str) -> Result<DkimKeyRecord, DkimParseError> {
    DkimKeyRecord::parse(txt_record)
}
