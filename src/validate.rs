//! Record validation facade for integration layers.
//!
//! Each method takes the TXT text as published and either returns the
//! structured record or a [`ValidationError`] that renders the reason next to
//! the original text.

use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use crate::dkim::{DkimKeyRecord, DkimParseError};
use crate::dmarc::{adapt, DmarcGrammar, DmarcParseError, DmarcParser, DmarcSummary};
use crate::spf::{ClassifiedSpf, SpfGrammar, SpfParseError, SpfParser, MAX_DNS_LOOKUPS};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when an SPF record needs more DNS lookups than allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LookupLimitPolicy {
    /// Count and log only; the record still validates.
    #[default]
    Report,
    /// Reject the record with [`RecordError::TooManyDnsLookups`].
    Enforce,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ValidatorConfig {
    pub lookup_limit: LookupLimitPolicy,
    pub max_dns_lookups: usize,
    /// Classify unknown SPF mechanisms as `unknown` instead of rejecting
    /// the record. Only affects the built-in SPF grammar.
    pub allow_unknown_spf_mechanisms: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            lookup_limit: LookupLimitPolicy::Report,
            max_dns_lookups: MAX_DNS_LOOKUPS,
            allow_unknown_spf_mechanisms: false,
        }
    }
}

impl ValidatorConfig {
    pub fn with_lookup_limit(mut self, policy: LookupLimitPolicy) -> Self {
        self.lookup_limit = policy;
        self
    }

    pub fn with_max_dns_lookups(mut self, max: usize) -> Self {
        self.max_dns_lookups = max;
        self
    }

    pub fn with_unknown_spf_mechanisms(mut self, allow: bool) -> Self {
        self.allow_unknown_spf_mechanisms = allow;
        self
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecordKind {
    Dkim,
    Spf,
    Dmarc,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordKind::Dkim => "DKIM",
            RecordKind::Spf => "SPF",
            RecordKind::Dmarc => "DMARC",
        })
    }
}

/// Why a record was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error(transparent)]
    Dkim(#[from] DkimParseError),
    #[error(transparent)]
    Spf(#[from] SpfParseError),
    #[error(transparent)]
    Dmarc(#[from] DmarcParseError),
    #[error("record requires {count} DNS lookups, more than the limit of {limit}")]
    TooManyDnsLookups { count: usize, limit: usize },
}

impl RecordError {
    pub fn kind_code(&self) -> &'static str {
        match self {
            RecordError::Dkim(e) => e.kind.as_str(),
            RecordError::Spf(e) => e.kind(),
            RecordError::Dmarc(e) => e.kind.as_str(),
            RecordError::TooManyDnsLookups { .. } => "too_many_dns_lookups",
        }
    }
}

/// A rejected record, carrying the original text for display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("The {record_kind} record is malformed: {reason}\n\nRecord: {record}")]
pub struct ValidationError {
    pub record_kind: RecordKind,
    #[source]
    pub reason: RecordError,
    pub record: String,
}

impl ValidationError {
    fn new(record_kind: RecordKind, reason: impl Into<RecordError>, record: &str) -> Self {
        let reason = reason.into();
        debug!(kind = %record_kind, code = reason.kind_code(), "record rejected: {}", reason);
        Self {
            record_kind,
            reason,
            record: record.to_string(),
        }
    }

    /// Stable machine-checkable code, e.g. `key_too_short` or `invalid_cidr`.
    pub fn kind_code(&self) -> &'static str {
        self.reason.kind_code()
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Validates DKIM, SPF and DMARC record text.
///
/// The SPF and DMARC grammars are pluggable; by default the built-in
/// [`SpfParser`] and [`DmarcParser`] are used.
#[derive(Debug, Clone)]
pub struct Validator<S = SpfParser, D = DmarcParser> {
    config: ValidatorConfig,
    spf_grammar: S,
    dmarc_grammar: D,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        let spf_grammar =
            SpfParser::new().allow_unknown_mechanisms(config.allow_unknown_spf_mechanisms);
        Self {
            config,
            spf_grammar,
            dmarc_grammar: DmarcParser::new(),
        }
    }
}

impl<S: SpfGrammar, D: DmarcGrammar> Validator<S, D> {
    /// Replace the SPF grammar.
    pub fn with_spf_grammar<S2: SpfGrammar>(self, grammar: S2) -> Validator<S2, D> {
        Validator {
            config: self.config,
            spf_grammar: grammar,
            dmarc_grammar: self.dmarc_grammar,
        }
    }

    /// Replace the DMARC grammar.
    pub fn with_dmarc_grammar<D2: DmarcGrammar>(self, grammar: D2) -> Validator<S, D2> {
        Validator {
            config: self.config,
            spf_grammar: self.spf_grammar,
            dmarc_grammar: grammar,
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate a DKIM key record.
    pub fn dkim(&self, record: &str) -> Result<DkimKeyRecord, ValidationError> {
        let key = DkimKeyRecord::parse(record)
            .map_err(|e| ValidationError::new(RecordKind::Dkim, e, record))?;
        debug!(
            key_type = %key.key_type,
            revoked = key.revoked,
            bits = ?key.key_bits,
            "DKIM record valid"
        );
        Ok(key)
    }

    /// Validate and classify an SPF record.
    pub fn spf(&self, record: &str) -> Result<ClassifiedSpf, ValidationError> {
        let parsed = self
            .spf_grammar
            .parse(record)
            .map_err(|e| ValidationError::new(RecordKind::Spf, e, record))?;
        let classified = ClassifiedSpf::from_record(&parsed);

        let limit = self.config.max_dns_lookups;
        if classified.exceeds_lookup_limit(limit) {
            let count = classified.dns_lookup_count;
            match self.config.lookup_limit {
                LookupLimitPolicy::Enforce => {
                    return Err(ValidationError::new(
                        RecordKind::Spf,
                        RecordError::TooManyDnsLookups { count, limit },
                        record,
                    ));
                }
                LookupLimitPolicy::Report => {
                    warn!(count, limit, "SPF record exceeds DNS lookup limit");
                }
            }
        }

        debug!(
            mechanisms = classified.mechanisms.len(),
            dns_lookups = classified.dns_lookup_count,
            "SPF record valid"
        );
        Ok(classified)
    }

    /// Validate a DMARC record and expose its policy fields.
    pub fn dmarc(&self, record: &str) -> Result<DmarcSummary, ValidationError> {
        let parsed = self
            .dmarc_grammar
            .parse(record)
            .map_err(|e| ValidationError::new(RecordKind::Dmarc, e, record))?;
        debug!(policy = %parsed.policy, "DMARC record valid");
        Ok(adapt(&parsed))
    }
}
