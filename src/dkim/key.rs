use base64::Engine;
use tracing::trace;

use super::crypto::{self, DecodedKey, MIN_RSA_BITS};
use super::error::{DkimErrorKind, DkimParseError};
use super::types::{DkimKeyRecord, KeyType};
use crate::common::tags::{parse_tag_map, split_colon_list};

impl DkimKeyRecord {
    /// Parse a DKIM DNS TXT key record.
    /// Input should be the concatenated TXT record strings.
    pub fn parse(txt_record: &str) -> Result<Self, DkimParseError> {
        let tags = parse_tag_map(txt_record)?;
        let get = |name: &str| tags.get(name).map(String::as_str);

        // v= optional, but if present must be exactly "DKIM1"
        if let Some(v) = get("v") {
            if v != "DKIM1" {
                return Err(DkimParseError::new(
                    DkimErrorKind::UnsupportedVersion,
                    format!("incompatible DKIM version {:?}: expected DKIM1", v),
                ));
            }
        }

        let p_raw = get("p").ok_or_else(|| {
            DkimParseError::new(
                DkimErrorKind::MissingPublicKey,
                "missing required 'p' tag (public key)",
            )
        })?;

        let (key_type, public_key, key_bits, revoked) = if p_raw.is_empty() {
            // Revoked: no key to check, and k= is not consulted.
            trace!("DKIM key revoked");
            (KeyType::Rsa, String::new(), None, true)
        } else {
            let cleaned: String = p_raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            let decoded = base64::engine::general_purpose::STANDARD
                .decode(&cleaned)
                .map_err(|e| {
                    DkimParseError::new(
                        DkimErrorKind::InvalidBase64,
                        format!("invalid base64 in public key 'p={}': {}", cleaned, e),
                    )
                })?;

            let key_type = match get("k") {
                Some(k) => KeyType::parse(k).ok_or_else(|| {
                    DkimParseError::new(
                        DkimErrorKind::UnsupportedKeyType,
                        format!("unsupported key type 'k={}' (expected rsa or ed25519)", k),
                    )
                })?,
                None => KeyType::Rsa,
            };

            let key_bits = match key_type {
                KeyType::Rsa => Some(check_rsa_key(&decoded)?),
                KeyType::Ed25519 => {
                    check_ed25519_key(&decoded)?;
                    None
                }
            };
            (key_type, cleaned, key_bits, false)
        };

        let list = |name: &str| get(name).map(split_colon_list).unwrap_or_default();

        Ok(DkimKeyRecord {
            key_type,
            public_key,
            hash_algorithms: list("h"),
            services: list("s"),
            flags: list("t"),
            notes: get("n").map(str::to_string),
            revoked,
            key_bits,
        })
    }
}

/// Returns the modulus size in bits.
fn check_rsa_key(der: &[u8]) -> Result<usize, DkimParseError> {
    match crypto::decode_rsa_key(der) {
        Some(DecodedKey::Rsa { modulus_bits }) if modulus_bits < MIN_RSA_BITS => {
            Err(DkimParseError::new(
                DkimErrorKind::KeyTooShort,
                format!(
                    "RSA key too short: {} bits (minimum {} required)",
                    modulus_bits, MIN_RSA_BITS
                ),
            ))
        }
        Some(DecodedKey::Rsa { modulus_bits }) => Ok(modulus_bits),
        Some(DecodedKey::Other { algorithm }) => Err(DkimParseError::new(
            DkimErrorKind::KeyAlgorithmMismatch,
            format!("public key is not an RSA key (algorithm OID {})", algorithm),
        )),
        None => Err(DkimParseError::new(
            DkimErrorKind::InvalidKeyEncoding,
            "invalid RSA public key: neither SubjectPublicKeyInfo nor PKCS#1 RSAPublicKey",
        )),
    }
}

fn check_ed25519_key(raw: &[u8]) -> Result<(), DkimParseError> {
    if crypto::is_ed25519_key_len(raw) {
        return Ok(());
    }
    Err(DkimParseError::new(
        DkimErrorKind::InvalidKeySize,
        format!(
            "invalid Ed25519 public key size: got {} bytes, expected {}",
            raw.len(),
            crypto::ed25519_key_len()
        ),
    ))
}
