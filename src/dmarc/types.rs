use std::fmt;

/// DMARC policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Policy {
    /// No action, monitoring only.
    None,
    /// Treat as suspicious (spam folder).
    Quarantine,
    /// Reject the message.
    Reject,
}

impl Policy {
    /// Parse policy string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Some(Policy::None),
            "quarantine" => Some(Policy::Quarantine),
            "reject" => Some(Policy::Reject),
            _ => Option::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::None => "none",
            Policy::Quarantine => "quarantine",
            Policy::Reject => "reject",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alignment mode for DKIM/SPF.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlignmentMode {
    /// Organizational domain match.
    #[default]
    Relaxed,
    /// Exact domain match.
    Strict,
}

impl AlignmentMode {
    /// Parse alignment mode: "r" → Relaxed, "s" → Strict.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "r" => Some(AlignmentMode::Relaxed),
            "s" => Some(AlignmentMode::Strict),
            _ => Option::None,
        }
    }

    /// Tag value form: `r` or `s`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlignmentMode::Relaxed => "r",
            AlignmentMode::Strict => "s",
        }
    }
}

impl fmt::Display for AlignmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reporting option (fo= tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FailureOption {
    /// Generate report if all mechanisms fail.
    Zero,
    /// Generate report if any mechanism fails.
    One,
    /// Generate report if DKIM fails.
    D,
    /// Generate report if SPF fails.
    S,
}

impl FailureOption {
    /// Parse a single failure option character (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "0" => Some(FailureOption::Zero),
            "1" => Some(FailureOption::One),
            "d" => Some(FailureOption::D),
            "s" => Some(FailureOption::S),
            _ => Option::None,
        }
    }
}

/// Report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReportFormat {
    /// Authentication Failure Reporting Format (RFC 6591).
    #[default]
    Afrf,
}

impl ReportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "afrf" => Some(ReportFormat::Afrf),
            _ => Option::None,
        }
    }
}

/// Report URI (mailto: address with optional size limit).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReportUri {
    /// The URI as written in the record.
    pub uri: String,
    /// Email address (after stripping mailto: prefix).
    pub address: String,
    /// Maximum report size in bytes.
    pub max_size: Option<u64>,
}

/// Parsed DMARC record, as produced by a [`DmarcGrammar`](super::DmarcGrammar).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DmarcRecord {
    /// Policy for organizational domain (p= tag).
    pub policy: Policy,
    /// Subdomain policy (sp= tag). Absent means p= applies.
    pub subdomain_policy: Option<Policy>,
    /// Non-existent subdomain policy (np= tag, RFC 9091).
    pub non_existent_subdomain_policy: Option<Policy>,
    /// DKIM alignment mode (adkim= tag, default: Relaxed).
    pub dkim_alignment: AlignmentMode,
    /// SPF alignment mode (aspf= tag, default: Relaxed).
    pub spf_alignment: AlignmentMode,
    /// Percentage of messages to apply policy (pct= tag). Absent means 100.
    pub percent: Option<u8>,
    /// Failure reporting options (fo= tag).
    pub failure_options: Vec<FailureOption>,
    /// Report format (rf= tag, default: AFRF).
    pub report_format: ReportFormat,
    /// Aggregate report interval in seconds (ri= tag, default: 86400).
    pub report_interval: u32,
    /// Aggregate report URIs (rua= tag).
    pub rua: Vec<ReportUri>,
    /// Failure report URIs (ruf= tag).
    pub ruf: Vec<ReportUri>,
}
