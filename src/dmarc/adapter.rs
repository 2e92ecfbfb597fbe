use super::types::{AlignmentMode, DmarcRecord, Policy};

/// The DMARC fields exposed to the integration layer.
///
/// A field-for-field copy of what the grammar already validated; report URIs
/// are flattened to the text written in the record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DmarcSummary {
    pub policy: Policy,
    pub subdomain_policy: Option<Policy>,
    pub dkim_alignment: AlignmentMode,
    pub spf_alignment: AlignmentMode,
    pub percent: Option<u8>,
    pub report_uri_aggregate: Vec<String>,
    pub report_uri_failure: Vec<String>,
}

impl DmarcSummary {
    /// Policy for subdomains: `sp=` when published, otherwise `p=`.
    pub fn effective_subdomain_policy(&self) -> Policy {
        self.subdomain_policy.unwrap_or(self.policy)
    }

    /// Sampling rate, 100 when `pct=` is absent.
    pub fn effective_percent(&self) -> u8 {
        self.percent.unwrap_or(100)
    }
}

impl From<&DmarcRecord> for DmarcSummary {
    fn from(record: &DmarcRecord) -> Self {
        adapt(record)
    }
}

/// Copy a grammar-validated record into its summary. Performs no validation.
pub fn adapt(record: &DmarcRecord) -> DmarcSummary {
    DmarcSummary {
        policy: record.policy,
        subdomain_policy: record.subdomain_policy,
        dkim_alignment: record.dkim_alignment,
        spf_alignment: record.spf_alignment,
        percent: record.percent,
        report_uri_aggregate: record.rua.iter().map(|u| u.uri.clone()).collect(),
        report_uri_failure: record.ruf.iter().map(|u| u.uri.clone()).collect(),
    }
}
