//! Projection of parsed directives into qualifier/type/value triples, plus
//! the DNS lookup count of RFC 7208 Section 4.6.4.

use std::fmt;

use super::types::{Directive, Mechanism, Qualifier, SpfRecord};
use crate::common::cidr::{ip4_network, ip6_network};

/// Mechanism type as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MechanismKind {
    All,
    Include,
    A,
    Mx,
    Ip4,
    Ip6,
    Exists,
    Ptr,
    Unknown,
}

impl MechanismKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MechanismKind::All => "all",
            MechanismKind::Include => "include",
            MechanismKind::A => "a",
            MechanismKind::Mx => "mx",
            MechanismKind::Ip4 => "ip4",
            MechanismKind::Ip6 => "ip6",
            MechanismKind::Exists => "exists",
            MechanismKind::Ptr => "ptr",
            MechanismKind::Unknown => "unknown",
        }
    }

    /// Whether evaluating this mechanism costs a DNS lookup.
    pub fn requires_dns_lookup(&self) -> bool {
        matches!(
            self,
            MechanismKind::Include
                | MechanismKind::A
                | MechanismKind::Mx
                | MechanismKind::Ptr
                | MechanismKind::Exists
        )
    }
}

impl fmt::Display for MechanismKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One directive reduced to qualifier, type and a type-dependent value.
///
/// `value` is the domain spec for include/exists/ptr/a/mx (empty when a/mx/ptr
/// name no domain, meaning the record's own domain), `network/prefix` for
/// ip4/ip6, empty for all, and the verbatim term for unknown mechanisms.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassifiedMechanism {
    pub qualifier: Qualifier,
    pub kind: MechanismKind,
    pub value: String,
}

/// A classified SPF record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassifiedSpf {
    /// In record order; SPF evaluates left to right.
    pub mechanisms: Vec<ClassifiedMechanism>,
    pub redirect: Option<String>,
    pub explanation: Option<String>,
    pub dns_lookup_count: usize,
}

impl ClassifiedSpf {
    /// Classify a grammar result, keeping its `redirect` and `exp` modifiers.
    pub fn from_record(record: &SpfRecord) -> Self {
        let mut classified = classify_spf(&record.directives, record.redirect.as_deref());
        classified.explanation = record.explanation.clone();
        classified
    }

    /// The count is only computed here; callers decide whether exceeding
    /// the limit is an error.
    pub fn exceeds_lookup_limit(&self, limit: usize) -> bool {
        self.dns_lookup_count > limit
    }
}

/// Classify a single directive.
pub fn classify_directive(directive: &Directive) -> ClassifiedMechanism {
    let (kind, value) = match &directive.mechanism {
        Mechanism::All => (MechanismKind::All, String::new()),
        Mechanism::Include { domain } => (MechanismKind::Include, domain.clone()),
        Mechanism::Exists { domain } => (MechanismKind::Exists, domain.clone()),
        Mechanism::Ptr { domain } => (MechanismKind::Ptr, domain.clone().unwrap_or_default()),
        Mechanism::A { domain, .. } => (MechanismKind::A, domain.clone().unwrap_or_default()),
        Mechanism::Mx { domain, .. } => (MechanismKind::Mx, domain.clone().unwrap_or_default()),
        Mechanism::Ip4 { addr, prefix } => {
            let prefix = prefix.unwrap_or(32);
            (MechanismKind::Ip4, format!("{}/{}", ip4_network(*addr, prefix), prefix))
        }
        Mechanism::Ip6 { addr, prefix } => {
            let prefix = prefix.unwrap_or(128);
            (MechanismKind::Ip6, format!("{}/{}", ip6_network(*addr, prefix), prefix))
        }
        Mechanism::Unknown { raw } => (MechanismKind::Unknown, raw.clone()),
    };
    ClassifiedMechanism {
        qualifier: directive.qualifier,
        kind,
        value,
    }
}

/// Classify every directive, preserving order. Never fails.
pub fn classify(directives: &[Directive]) -> Vec<ClassifiedMechanism> {
    directives.iter().map(classify_directive).collect()
}

/// Classify directives and count DNS lookups: one per include, a, mx, ptr
/// and exists, plus one for a `redirect` modifier.
pub fn classify_spf(directives: &[Directive], redirect: Option<&str>) -> ClassifiedSpf {
    let mechanisms = classify(directives);
    let dns_lookup_count = mechanisms
        .iter()
        .filter(|m| m.kind.requires_dns_lookup())
        .count()
        + usize::from(redirect.is_some());

    ClassifiedSpf {
        mechanisms,
        redirect: redirect.map(str::to_string),
        explanation: None,
        dns_lookup_count,
    }
}
