//! Parsing helpers shared by the DKIM, SPF and DMARC modules.

pub mod cidr;
pub mod tags;
