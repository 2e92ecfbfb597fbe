use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use thiserror::Error;

/// Qualifier prefix on a directive (RFC 7208 Section 4.6.2).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Qualifier {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "+"))]
    Pass,
    #[cfg_attr(feature = "serde", serde(rename = "-"))]
    Fail,
    #[cfg_attr(feature = "serde", serde(rename = "~"))]
    SoftFail,
    #[cfg_attr(feature = "serde", serde(rename = "?"))]
    Neutral,
}

impl Qualifier {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Qualifier::Pass),
            '-' => Some(Qualifier::Fail),
            '~' => Some(Qualifier::SoftFail),
            '?' => Some(Qualifier::Neutral),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Qualifier::Pass => '+',
            Qualifier::Fail => '-',
            Qualifier::SoftFail => '~',
            Qualifier::Neutral => '?',
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// SPF mechanism variants (RFC 7208 Section 5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mechanism {
    All,
    Include { domain: String },
    A { domain: Option<String>, cidr4: Option<u8>, cidr6: Option<u8> },
    Mx { domain: Option<String>, cidr4: Option<u8>, cidr6: Option<u8> },
    Ptr { domain: Option<String> },
    Ip4 { addr: Ipv4Addr, prefix: Option<u8> },
    Ip6 { addr: Ipv6Addr, prefix: Option<u8> },
    Exists { domain: String },
    /// A mechanism name this grammar does not know, kept verbatim
    /// (without its qualifier).
    Unknown { raw: String },
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mechanism::All => f.write_str("all"),
            Mechanism::Include { domain } => write!(f, "include:{}", domain),
            Mechanism::A { domain, cidr4, cidr6 } => {
                f.write_str("a")?;
                write_domain_cidr(f, domain.as_deref(), *cidr4, *cidr6)
            }
            Mechanism::Mx { domain, cidr4, cidr6 } => {
                f.write_str("mx")?;
                write_domain_cidr(f, domain.as_deref(), *cidr4, *cidr6)
            }
            Mechanism::Ptr { domain: Some(domain) } => write!(f, "ptr:{}", domain),
            Mechanism::Ptr { domain: None } => f.write_str("ptr"),
            Mechanism::Ip4 { addr, prefix } => {
                write!(f, "ip4:{}", addr)?;
                match prefix {
                    Some(p) => write!(f, "/{}", p),
                    None => Ok(()),
                }
            }
            Mechanism::Ip6 { addr, prefix } => {
                write!(f, "ip6:{}", addr)?;
                match prefix {
                    Some(p) => write!(f, "/{}", p),
                    None => Ok(()),
                }
            }
            Mechanism::Exists { domain } => write!(f, "exists:{}", domain),
            Mechanism::Unknown { raw } => f.write_str(raw),
        }
    }
}

fn write_domain_cidr(
    f: &mut fmt::Formatter<'_>,
    domain: Option<&str>,
    cidr4: Option<u8>,
    cidr6: Option<u8>,
) -> fmt::Result {
    if let Some(domain) = domain {
        write!(f, ":{}", domain)?;
    }
    if let Some(c) = cidr4 {
        write!(f, "/{}", c)?;
    }
    if let Some(c) = cidr6 {
        write!(f, "//{}", c)?;
    }
    Ok(())
}

/// A directive is a qualifier + mechanism pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub qualifier: Qualifier,
    pub mechanism: Mechanism,
}

impl fmt::Display for Directive {
    /// Canonical term text. The default `+` qualifier is left implicit.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.qualifier != Qualifier::Pass {
            write!(f, "{}", self.qualifier)?;
        }
        write!(f, "{}", self.mechanism)
    }
}

/// Output of an SPF grammar: directives in evaluation order plus modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpfRecord {
    pub directives: Vec<Directive>,
    pub redirect: Option<String>,
    pub explanation: Option<String>,
}

/// Grammar-level rejection of an SPF record. Each variant carries the
/// offending term.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpfParseError {
    #[error("invalid SPF version: expected 'v=spf1', found {0:?}")]
    InvalidVersion(String),
    #[error("unknown mechanism: {0}")]
    UnknownMechanism(String),
    #[error("missing required argument for {0}")]
    MissingArgument(String),
    #[error("invalid mechanism argument: {0}")]
    InvalidArgument(String),
    #[error("invalid CIDR prefix in {0}")]
    InvalidCidr(String),
    #[error("invalid IP address in {0}")]
    InvalidAddress(String),
    #[error("duplicate modifier: {0}")]
    DuplicateModifier(String),
}

impl SpfParseError {
    /// Stable identifier for machine checks.
    pub fn kind(&self) -> &'static str {
        match self {
            SpfParseError::InvalidVersion(_) => "invalid_version",
            SpfParseError::UnknownMechanism(_) => "unknown_mechanism",
            SpfParseError::MissingArgument(_) => "missing_argument",
            SpfParseError::InvalidArgument(_) => "invalid_argument",
            SpfParseError::InvalidCidr(_) => "invalid_cidr",
            SpfParseError::InvalidAddress(_) => "invalid_address",
            SpfParseError::DuplicateModifier(_) => "duplicate_modifier",
        }
    }
}
