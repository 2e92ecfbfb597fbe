use std::fmt;

/// Key type from the `k=` tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum KeyType {
    #[default]
    Rsa,
    Ed25519,
}

impl KeyType {
    /// Exact, case-sensitive match. An empty value means the default (`rsa`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rsa" | "" => Some(KeyType::Rsa),
            "ed25519" => Some(KeyType::Ed25519),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Rsa => "rsa",
            KeyType::Ed25519 => "ed25519",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated DKIM DNS key record.
///
/// `public_key` is the base64 text of `p=` with whitespace removed, and is
/// empty exactly when the key is revoked. List tags keep record order and
/// duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DkimKeyRecord {
    pub key_type: KeyType,
    pub public_key: String,
    pub hash_algorithms: Vec<String>,
    pub services: Vec<String>,
    pub flags: Vec<String>,
    pub notes: Option<String>,
    pub revoked: bool,
    /// RSA modulus size in bits, rounded up to whole octets.
    pub key_bits: Option<usize>,
}

impl DkimKeyRecord {
    /// `t=y`: the domain is testing DKIM.
    pub fn is_testing(&self) -> bool {
        self.flags.iter().any(|f| f == "y")
    }

    /// `t=s`: the `i=` domain of signatures must equal `d=` exactly.
    pub fn is_strict(&self) -> bool {
        self.flags.iter().any(|f| f == "s")
    }

    /// Whether `h=` allows the given hash. No `h=` allows every hash.
    pub fn permits_hash(&self, hash: &str) -> bool {
        self.hash_algorithms.is_empty()
            || self
                .hash_algorithms
                .iter()
                .any(|h| h.eq_ignore_ascii_case(hash))
    }

    /// Whether `s=` covers the given service. No `s=` or `*` covers all.
    pub fn permits_service(&self, service: &str) -> bool {
        self.services.is_empty()
            || self
                .services
                .iter()
                .any(|s| s == "*" || s.eq_ignore_ascii_case(service))
    }
}
