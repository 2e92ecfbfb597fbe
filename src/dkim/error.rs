use std::fmt;

use crate::common::tags::TagError;

/// Why a DKIM key record was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DkimErrorKind {
    /// A `;`-separated segment has no `=`.
    MalformedTag,
    /// A segment has nothing before its `=`.
    EmptyTagName,
    /// `v=` present but not `DKIM1`.
    UnsupportedVersion,
    /// No `p=` tag.
    MissingPublicKey,
    InvalidBase64,
    /// `k=` is neither `rsa` nor `ed25519`.
    UnsupportedKeyType,
    /// Key bytes are neither SubjectPublicKeyInfo nor PKCS#1 RSAPublicKey.
    InvalidKeyEncoding,
    /// Well-formed key of another algorithm where RSA was declared.
    KeyAlgorithmMismatch,
    /// RSA modulus under 1024 bits (RFC 8301).
    KeyTooShort,
    /// Ed25519 key is not 32 bytes.
    InvalidKeySize,
}

impl DkimErrorKind {
    /// Stable identifier for machine checks.
    pub fn as_str(&self) -> &'static str {
        match self {
            DkimErrorKind::MalformedTag => "malformed_tag",
            DkimErrorKind::EmptyTagName => "empty_tag_name",
            DkimErrorKind::UnsupportedVersion => "unsupported_version",
            DkimErrorKind::MissingPublicKey => "missing_public_key",
            DkimErrorKind::InvalidBase64 => "invalid_base64",
            DkimErrorKind::UnsupportedKeyType => "unsupported_key_type",
            DkimErrorKind::InvalidKeyEncoding => "invalid_key_encoding",
            DkimErrorKind::KeyAlgorithmMismatch => "key_algorithm_mismatch",
            DkimErrorKind::KeyTooShort => "key_too_short",
            DkimErrorKind::InvalidKeySize => "invalid_key_size",
        }
    }
}

impl fmt::Display for DkimErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error from DKIM key record parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DkimParseError {
    pub kind: DkimErrorKind,
    pub detail: String,
}

impl DkimParseError {
    pub(crate) fn new(kind: DkimErrorKind, detail: impl Into<String>) -> Self {
        DkimParseError {
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for DkimParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.detail)
    }
}

impl std::error::Error for DkimParseError {}

impl From<TagError> for DkimParseError {
    fn from(err: TagError) -> Self {
        let kind = match err {
            TagError::MissingEquals(_) => DkimErrorKind::MalformedTag,
            TagError::EmptyName(_) => DkimErrorKind::EmptyTagName,
        };
        DkimParseError::new(kind, err.to_string())
    }
}
