//! Structural decoding of DKIM public key material.
//!
//! RSA keys are published either as a DER SubjectPublicKeyInfo or as a bare
//! PKCS#1 RSAPublicKey. Both are read through the SPKI decoder: a bare key is
//! first wrapped in an rsaEncryption SPKI.

use ring::signature::ED25519_PUBLIC_KEY_LEN;
use tracing::trace;
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

/// RFC 8301 floor for RSA modulus size.
pub(super) const MIN_RSA_BITS: usize = 1024;

/// What the decoded DER turned out to hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum DecodedKey {
    Rsa { modulus_bits: usize },
    /// A structurally valid key of some other algorithm, named by OID.
    Other { algorithm: String },
}

/// Decode RSA key bytes as SPKI, falling back to PKCS#1.
/// `None` when neither encoding parses.
pub(super) fn decode_rsa_key(der: &[u8]) -> Option<DecodedKey> {
    if let Some(key) = decode_spki(der) {
        trace!("key decoded as SubjectPublicKeyInfo");
        return Some(key);
    }
    let wrapped = wrap_pkcs1_in_spki(der);
    let key = decode_spki(&wrapped)?;
    trace!("key decoded as PKCS#1 RSAPublicKey");
    Some(key)
}

/// Ed25519 public keys in DKIM are the raw 32-byte point.
pub(super) fn is_ed25519_key_len(raw: &[u8]) -> bool {
    raw.len() == ED25519_PUBLIC_KEY_LEN
}

pub(super) fn ed25519_key_len() -> usize {
    ED25519_PUBLIC_KEY_LEN
}

fn decode_spki(der: &[u8]) -> Option<DecodedKey> {
    let (rest, spki) = SubjectPublicKeyInfo::from_der(der).ok()?;
    if !rest.is_empty() {
        return None;
    }
    let algorithm = spki.algorithm.algorithm.to_id_string();
    match spki.parsed().ok()? {
        PublicKey::RSA(rsa) => {
            if !is_positive(rsa.modulus) || !is_positive(rsa.exponent) {
                trace!("RSA key has a non-positive modulus or exponent");
                return None;
            }
            rsa.try_exponent().ok()?;
            Some(DecodedKey::Rsa {
                modulus_bits: modulus_bits(rsa.modulus),
            })
        }
        PublicKey::EC(_) | PublicKey::DSA(_) => Some(DecodedKey::Other { algorithm }),
        PublicKey::Unknown(_) if KNOWN_NON_RSA_OIDS.contains(&algorithm.as_str()) => {
            Some(DecodedKey::Other { algorithm })
        }
        // Algorithms outside this set are not recognizable keys at all.
        _ => None,
    }
}

/// Ed25519 and X25519, which x509-parser leaves undecoded.
const KNOWN_NON_RSA_OIDS: &[&str] = &["1.3.101.112", "1.3.101.110"];

/// DER INTEGER content that encodes a value greater than zero.
fn is_positive(int: &[u8]) -> bool {
    match int.first() {
        None => false,
        Some(&first) if first & 0x80 != 0 => false,
        Some(_) => int.iter().any(|&b| b != 0),
    }
}

/// Modulus length in octets (leading zero octets stripped), times 8.
fn modulus_bits(modulus: &[u8]) -> usize {
    let significant = modulus.iter().position(|&b| b != 0).unwrap_or(modulus.len());
    (modulus.len() - significant) * 8
}

/// Wrap PKCS#1 RSAPublicKey DER in SubjectPublicKeyInfo (SPKI) DER.
/// SPKI = SEQUENCE { AlgorithmIdentifier, BIT STRING { PKCS#1 } }
/// AlgorithmIdentifier = SEQUENCE { OID(rsaEncryption), NULL }
fn wrap_pkcs1_in_spki(pkcs1_der: &[u8]) -> Vec<u8> {
    let algo_id: &[u8] = &[
        0x30, 0x0d, // SEQUENCE, 13 bytes
        0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01, // OID
        0x05, 0x00, // NULL
    ];

    let mut bit_string = vec![0x03];
    encode_asn1_length(&mut bit_string, 1 + pkcs1_der.len());
    bit_string.push(0x00); // unused bits
    bit_string.extend_from_slice(pkcs1_der);

    let mut spki = vec![0x30];
    encode_asn1_length(&mut spki, algo_id.len() + bit_string.len());
    spki.extend_from_slice(algo_id);
    spki.extend_from_slice(&bit_string);
    spki
}

/// Encode ASN.1 DER length.
fn encode_asn1_length(output: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        output.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    let significant = &bytes[skip..];
    output.push(0x80 | significant.len() as u8);
    output.extend_from_slice(significant);
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    const RSA_2048_SPKI: &str = "MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAslNwuZhmxPMyq/lkrTzBxPeAj9tsq1EV8DzMOOzHYbUlab+mu3AgYFMaO0vzVs+n4ZA1Q7niepG2ADatyjGok0QlaWOnPyONV2YfMZM/zJZr291q/O+ov0EiF+BFr6zolTEsVlLhdhwlvS1XwBttQOofznOQdpaHAc+1I985VQYg5ejyd9EAw8WiOnTJZg6h6rKqtMazuHL5apPSCs5hS1H7imD9aPF2cPvTDX/GpIg2KRSI6vcMHW9HS4iNlHkbcLAE7rzEDXNiWs2BbnP52qqneT1EKvPUz8ovfq+sBDonPbs/+D70Jp/uxhnuu12sGgp6A3O6OvgR7jpdTZoJRwIDAQAB";
    const RSA_1024_PKCS1: &str = "MIGJAoGBAO6jPnZzhdLDktvgAkdzySe4xF/j6rINOXzdbtc9MlqQJEYSFNMY6NqOj4aNAstLmbHbk6rl6Xj6PTacN0/gXMZH1n6w4RdoOVUiJix1kZhYcJfrCRnC7WF6AayqPziTVu3rlI7awxt5SXkHbDnr1VszheU+CfoYApHBM/d5HP3BAgMBAAE=";
    const EC_P256_SPKI: &str = "MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAE7G92nc0J/+iIESK0XV04NgGgGHxvbeldMw2zthlf90nW2IWj7vojBUsGa1bE2mwxgRobXTjcCC5q7s8OI3EeYQ==";

    fn der(b64: &str) -> Vec<u8> {
        base64::engine::general_purpose::STANDARD.decode(b64).unwrap()
    }

    #[test]
    fn spki_rsa_2048() {
        let key = decode_rsa_key(&der(RSA_2048_SPKI)).unwrap();
        assert_eq!(key, DecodedKey::Rsa { modulus_bits: 2048 });
    }

    #[test]
    fn pkcs1_rsa_1024() {
        let key = decode_rsa_key(&der(RSA_1024_PKCS1)).unwrap();
        assert_eq!(key, DecodedKey::Rsa { modulus_bits: 1024 });
    }

    #[test]
    fn ec_key_is_other_algorithm() {
        match decode_rsa_key(&der(EC_P256_SPKI)).unwrap() {
            DecodedKey::Other { algorithm } => assert_eq!(algorithm, "1.2.840.10045.2.1"),
            other => panic!("expected non-RSA key, got {:?}", other),
        }
    }

    #[test]
    fn garbage_is_not_a_key() {
        assert!(decode_rsa_key(&[0x30u8; 162]).is_none());
        assert!(decode_rsa_key(b"hello world").is_none());
        assert!(decode_rsa_key(&[]).is_none());
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = der(RSA_2048_SPKI);
        bytes.push(0x00);
        assert!(decode_rsa_key(&bytes).is_none());
    }

    #[test]
    fn modulus_bits_strips_sign_octet() {
        let mut modulus = vec![0x00];
        modulus.extend_from_slice(&[0xC1; 128]);
        assert_eq!(modulus_bits(&modulus), 1024);
        assert_eq!(modulus_bits(&[0x00, 0x00]), 0);
    }

    #[test]
    fn asn1_length_forms() {
        let mut out = Vec::new();
        encode_asn1_length(&mut out, 0x7f);
        assert_eq!(out, vec![0x7f]);

        let mut out = Vec::new();
        encode_asn1_length(&mut out, 0x8d);
        assert_eq!(out, vec![0x81, 0x8d]);

        let mut out = Vec::new();
        encode_asn1_length(&mut out, 0x010f);
        assert_eq!(out, vec![0x82, 0x01, 0x0f]);
    }

    #[test]
    fn wrapped_pkcs1_matches_published_spki() {
        // The 2048-bit SPKI fixture is exactly the PKCS#1 key plus this header.
        let spki = der(RSA_2048_SPKI);
        let pkcs1 = &spki[24..];
        assert_eq!(wrap_pkcs1_in_spki(pkcs1), spki);
    }

    fn der_tlv(tag: u8, content: &[u8]) -> Vec<u8> {
        let mut out = vec![tag];
        encode_asn1_length(&mut out, content.len());
        out.extend_from_slice(content);
        out
    }

    /// PKCS#1 RSAPublicKey with the given raw INTEGER contents.
    fn pkcs1(modulus: &[u8], exponent: &[u8]) -> Vec<u8> {
        let mut body = der_tlv(0x02, modulus);
        body.extend(der_tlv(0x02, exponent));
        der_tlv(0x30, &body)
    }

    #[test]
    fn handmade_pkcs1_accepted() {
        let mut modulus = vec![0x00];
        modulus.extend_from_slice(&[0xC1; 128]);
        let key = decode_rsa_key(&pkcs1(&modulus, &[0x01, 0x00, 0x01])).unwrap();
        assert_eq!(key, DecodedKey::Rsa { modulus_bits: 1024 });
    }

    #[test]
    fn negative_modulus_rejected() {
        assert!(decode_rsa_key(&pkcs1(&[0xC1; 129], &[0x01, 0x00, 0x01])).is_none());
    }

    #[test]
    fn zero_modulus_rejected() {
        assert!(decode_rsa_key(&pkcs1(&[0x00], &[0x01, 0x00, 0x01])).is_none());
        assert!(decode_rsa_key(&pkcs1(&[0x00; 129], &[0x01, 0x00, 0x01])).is_none());
    }

    #[test]
    fn non_positive_exponent_rejected() {
        let mut modulus = vec![0x00];
        modulus.extend_from_slice(&[0xC1; 128]);
        assert!(decode_rsa_key(&pkcs1(&modulus, &[0x00])).is_none());
        assert!(decode_rsa_key(&pkcs1(&modulus, &[0xFF])).is_none());
    }

    #[test]
    fn unrecognized_algorithm_is_not_a_key() {
        // AlgorithmIdentifier { 1.2.3.4 } around a 32-byte bit string
        let algo = der_tlv(0x30, &der_tlv(0x06, &[0x2a, 0x03, 0x04]));
        let mut bits = vec![0x00];
        bits.extend_from_slice(&[0xAB; 32]);
        let mut body = algo;
        body.extend(der_tlv(0x03, &bits));
        assert!(decode_rsa_key(&der_tlv(0x30, &body)).is_none());
    }

    #[test]
    fn ed25519_spki_is_other_algorithm() {
        let spki = der("MCowBQYDK2VwAyEAugXeHAdA6wuncow0BJ1R1nz5Q4g++9PYbnvd1+HxKKM=");
        assert_eq!(
            decode_rsa_key(&spki),
            Some(DecodedKey::Other { algorithm: "1.3.101.112".into() })
        );
    }

    #[test]
    fn ed25519_length() {
        assert!(is_ed25519_key_len(&[0xAB; 32]));
        assert!(!is_ed25519_key_len(&[0xAB; 31]));
        assert!(!is_ed25519_key_len(&[0xAB; 44]));
        assert_eq!(ed25519_key_len(), 32);
    }
}
