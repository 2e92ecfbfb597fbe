use std::fmt;

use super::types::{AlignmentMode, DmarcRecord, FailureOption, Policy, ReportFormat, ReportUri};
use super::DmarcGrammar;

/// Category of a DMARC grammar failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DmarcErrorKind {
    /// Empty record, or `v=DMARC1` missing from the first position.
    InvalidVersion,
    MissingPolicy,
    /// A known tag carries a value outside its grammar.
    InvalidValue,
    /// A `rua`/`ruf` entry is not a usable report URI.
    InvalidUri,
}

impl DmarcErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DmarcErrorKind::InvalidVersion => "invalid_version",
            DmarcErrorKind::MissingPolicy => "missing_policy",
            DmarcErrorKind::InvalidValue => "invalid_value",
            DmarcErrorKind::InvalidUri => "invalid_uri",
        }
    }
}

/// DMARC record parse error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmarcParseError {
    pub kind: DmarcErrorKind,
    pub detail: String,
}

impl DmarcParseError {
    fn new(kind: DmarcErrorKind, detail: impl Into<String>) -> Self {
        DmarcParseError {
            kind,
            detail: detail.into(),
        }
    }

    fn invalid_value(tag: &str, value: &str) -> Self {
        Self::new(
            DmarcErrorKind::InvalidValue,
            format!("invalid {}= value: '{}'", tag, value),
        )
    }
}

impl fmt::Display for DmarcParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.detail)
    }
}

impl std::error::Error for DmarcParseError {}

/// RFC 7489 Section 6.3 tag grammar, with `np=` from RFC 9091.
///
/// Tag names and values are case-insensitive, the first occurrence of a tag
/// wins, and unknown tags are ignored. Every known tag is checked strictly.
#[derive(Debug, Clone, Copy, Default)]
pub struct DmarcParser;

impl DmarcParser {
    pub fn new() -> Self {
        DmarcParser
    }
}

impl DmarcGrammar for DmarcParser {
    fn parse(&self, record: &str) -> Result<DmarcRecord, DmarcParseError> {
        DmarcRecord::parse(record)
    }
}

impl DmarcRecord {
    /// Parse a DMARC TXT record string into a DmarcRecord.
    pub fn parse(record: &str) -> Result<Self, DmarcParseError> {
        let tags = parse_tag_list(record);

        // v= MUST be first tag
        let (first_tag, first_val) = tags.first().ok_or_else(|| {
            DmarcParseError::new(DmarcErrorKind::InvalidVersion, "empty record")
        })?;
        if !first_tag.eq_ignore_ascii_case("v") {
            return Err(DmarcParseError::new(
                DmarcErrorKind::InvalidVersion,
                format!("v= must be first tag, found '{}='", first_tag),
            ));
        }
        if !first_val.eq_ignore_ascii_case("DMARC1") {
            return Err(DmarcParseError::new(
                DmarcErrorKind::InvalidVersion,
                format!("invalid version: '{}', expected 'DMARC1'", first_val),
            ));
        }

        let find = |name: &str| -> Option<&str> {
            tags[1..]
                .iter()
                .find(|(t, _)| t.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        };

        let policy = match find("p") {
            Some(v) => parse_policy("p", v)?,
            None => {
                return Err(DmarcParseError::new(
                    DmarcErrorKind::MissingPolicy,
                    "missing required p= tag",
                ))
            }
        };

        let subdomain_policy = find("sp").map(|v| parse_policy("sp", v)).transpose()?;
        let non_existent_subdomain_policy =
            find("np").map(|v| parse_policy("np", v)).transpose()?;

        let dkim_alignment = find("adkim")
            .map(|v| parse_alignment("adkim", v))
            .transpose()?
            .unwrap_or_default();
        let spf_alignment = find("aspf")
            .map(|v| parse_alignment("aspf", v))
            .transpose()?
            .unwrap_or_default();

        let percent = find("pct").map(parse_pct).transpose()?;

        let failure_options = match find("fo") {
            Some(v) => parse_fo(v)?,
            None => vec![FailureOption::Zero],
        };

        let report_format = find("rf")
            .map(|v| {
                ReportFormat::parse(v).ok_or_else(|| DmarcParseError::invalid_value("rf", v))
            })
            .transpose()?
            .unwrap_or_default();

        let report_interval = match find("ri") {
            Some(v) => v
                .parse::<u32>()
                .map_err(|_| DmarcParseError::invalid_value("ri", v))?,
            None => 86400,
        };

        let rua = find("rua").map(parse_uri_list).transpose()?.unwrap_or_default();
        let ruf = find("ruf").map(parse_uri_list).transpose()?.unwrap_or_default();

        Ok(DmarcRecord {
            policy,
            subdomain_policy,
            non_existent_subdomain_policy,
            dkim_alignment,
            spf_alignment,
            percent,
            failure_options,
            report_format,
            report_interval,
            rua,
            ruf,
        })
    }
}

/// Parse tag=value pairs from a semicolon-separated record.
/// Segments without `=` or with an empty tag name are skipped.
fn parse_tag_list(record: &str) -> Vec<(String, String)> {
    let mut tags = Vec::new();
    for part in record.split(';') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some((tag, val)) = trimmed.split_once('=') else {
            continue;
        };
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        tags.push((tag.to_string(), val.trim().to_string()));
    }
    tags
}

fn parse_policy(tag: &str, value: &str) -> Result<Policy, DmarcParseError> {
    Policy::parse(value).ok_or_else(|| DmarcParseError::invalid_value(tag, value))
}

fn parse_alignment(tag: &str, value: &str) -> Result<AlignmentMode, DmarcParseError> {
    AlignmentMode::parse(value).ok_or_else(|| DmarcParseError::invalid_value(tag, value))
}

/// pct= must be an integer in 0..=100.
fn parse_pct(value: &str) -> Result<u8, DmarcParseError> {
    match value.parse::<u8>() {
        Ok(n) if n <= 100 => Ok(n),
        _ => Err(DmarcParseError::new(
            DmarcErrorKind::InvalidValue,
            format!("invalid pct= value: '{}' (expected 0-100)", value),
        )),
    }
}

/// Colon-separated fo= options. Every option must be known.
fn parse_fo(value: &str) -> Result<Vec<FailureOption>, DmarcParseError> {
    value
        .split(':')
        .map(|s| {
            FailureOption::parse(s.trim())
                .ok_or_else(|| DmarcParseError::invalid_value("fo", value))
        })
        .collect()
}

/// Parse a comma-separated list of report URIs.
fn parse_uri_list(val: &str) -> Result<Vec<ReportUri>, DmarcParseError> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_report_uri)
        .collect()
}

/// Parse a single report URI: `mailto:address[!size[unit]]`.
fn parse_report_uri(uri: &str) -> Result<ReportUri, DmarcParseError> {
    let scheme_ok = uri
        .get(..7)
        .is_some_and(|s| s.eq_ignore_ascii_case("mailto:"));
    if !scheme_ok {
        return Err(DmarcParseError::new(
            DmarcErrorKind::InvalidUri,
            format!("unsupported URI scheme (only mailto: accepted): '{}'", uri),
        ));
    }
    let after_scheme = &uri[7..];

    // Check for size suffix: address!size[unit]
    let (address, max_size) = match after_scheme.rsplit_once('!') {
        Some((addr, size)) => (addr, Some(parse_size_suffix(uri, size)?)),
        None => (after_scheme, None),
    };

    if address.is_empty() || !address.contains('@') {
        return Err(DmarcParseError::new(
            DmarcErrorKind::InvalidUri,
            format!("invalid mailto: address in '{}'", uri),
        ));
    }

    Ok(ReportUri {
        uri: uri.to_string(),
        address: address.to_string(),
        max_size,
    })
}

/// Parse size suffix: number + optional unit (k/m/g/t).
fn parse_size_suffix(uri: &str, s: &str) -> Result<u64, DmarcParseError> {
    let invalid = || {
        DmarcParseError::new(
            DmarcErrorKind::InvalidUri,
            format!("invalid size limit '!{}' in '{}'", s, uri),
        )
    };

    let s_lower = s.to_ascii_lowercase();
    let (num_str, multiplier) = match s_lower.as_bytes().last() {
        Some(b'k') => (&s_lower[..s_lower.len() - 1], 1u64 << 10),
        Some(b'm') => (&s_lower[..s_lower.len() - 1], 1u64 << 20),
        Some(b'g') => (&s_lower[..s_lower.len() - 1], 1u64 << 30),
        Some(b't') => (&s_lower[..s_lower.len() - 1], 1u64 << 40),
        Some(_) => (s_lower.as_str(), 1u64),
        None => return Err(invalid()),
    };

    let num: u64 = num_str.parse().map_err(|_| invalid())?;
    num.checked_mul(multiplier).ok_or_else(invalid)
}
