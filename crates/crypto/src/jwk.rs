// Path: crates/crypto/src/jwk.rs
//! JWK (RFC 7517 / RFC 8037) import and export for every supported
//! algorithm.
//!
//! OKP keys (`Ed25519`, `X25519`) carry `x` and optionally the 32-byte seed
//! `d`; EC keys (`P-256`, `secp256k1`) carry the affine coordinates `x`/`y`
//! and optionally the private scalar `d`. All byte fields are base64url
//! without padding.

use crate::error::CryptoError;
use crate::keys::{
    ed25519::Ed25519KeyPair, p256::P256KeyPair, secp256k1::Secp256k1KeyPair,
    x25519::X25519KeyPair, KeyPair, PublicKey,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sage_types::message::KeyAlgorithm;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// A JSON Web Key restricted to the key types SAGE uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type: `OKP` or `EC`.
    pub kty: String,
    /// Curve name: `Ed25519`, `X25519`, `P-256`, or `secp256k1`.
    pub crv: String,
    /// Public value (OKP) or affine x coordinate (EC), base64url.
    pub x: String,
    /// Affine y coordinate (EC only), base64url.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    /// Private value, base64url. Absent in public-only keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    /// Optional key id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

fn b64(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn unb64(field: &str, value: &str) -> Result<Vec<u8>, CryptoError> {
    URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| CryptoError::InvalidInput(format!("JWK field {field}: {e}")))
}

/// Splits an uncompressed SEC1 point into its affine coordinates.
fn ec_coordinates(uncompressed: &[u8]) -> Result<(&[u8], &[u8]), CryptoError> {
    if uncompressed.len() != 65 || uncompressed.first() != Some(&0x04) {
        return Err(CryptoError::InvalidKey(
            "expected a 65-byte uncompressed SEC1 point".to_string(),
        ));
    }
    let body = uncompressed.get(1..).unwrap_or_default();
    Ok(body.split_at(32))
}

/// Rebuilds an uncompressed SEC1 point from affine coordinates.
fn ec_point(x: &[u8], y: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if x.len() != 32 || y.len() != 32 {
        return Err(CryptoError::InvalidKey(
            "EC coordinates must be 32 bytes each".to_string(),
        ));
    }
    let mut point = Vec::with_capacity(65);
    point.push(0x04);
    point.extend_from_slice(x);
    point.extend_from_slice(y);
    Ok(point)
}

/// Exports the public half of a key as a JWK.
pub fn export_public(public: &PublicKey) -> Result<Jwk, CryptoError> {
    let kid = Some(public.key_id());
    match public {
        PublicKey::Ed25519(b) => Ok(Jwk {
            kty: "OKP".into(),
            crv: "Ed25519".into(),
            x: b64(b),
            y: None,
            d: None,
            kid,
        }),
        PublicKey::X25519(b) => Ok(Jwk {
            kty: "OKP".into(),
            crv: "X25519".into(),
            x: b64(b),
            y: None,
            d: None,
            kid,
        }),
        PublicKey::EcdsaP256(b) => {
            let key = ::p256::ecdsa::VerifyingKey::from_sec1_bytes(b)
                .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
            let point = key.to_encoded_point(false);
            let (x, y) = ec_coordinates(point.as_bytes())?;
            Ok(Jwk {
                kty: "EC".into(),
                crv: "P-256".into(),
                x: b64(x),
                y: Some(b64(y)),
                d: None,
                kid,
            })
        }
        PublicKey::EcdsaSecp256k1(b) => {
            let key = ::k256::ecdsa::VerifyingKey::from_sec1_bytes(b)
                .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
            let point = key.to_encoded_point(false);
            let (x, y) = ec_coordinates(point.as_bytes())?;
            Ok(Jwk {
                kty: "EC".into(),
                crv: "secp256k1".into(),
                x: b64(x),
                y: Some(b64(y)),
                d: None,
                kid,
            })
        }
    }
}

/// Exports a key pair, including the private value, as a JWK.
pub fn export_private(keypair: &KeyPair) -> Result<Jwk, CryptoError> {
    let mut jwk = export_public(&keypair.public_key())?;
    let d: Zeroizing<Vec<u8>> = match keypair {
        KeyPair::Ed25519(kp) => Zeroizing::new(kp.seed().to_vec()),
        KeyPair::X25519(kp) => Zeroizing::new(kp.secret_bytes().to_vec()),
        KeyPair::EcdsaP256(kp) => Zeroizing::new(kp.private_scalar().to_vec()),
        KeyPair::EcdsaSecp256k1(kp) => Zeroizing::new(kp.private_scalar().to_vec()),
    };
    jwk.d = Some(b64(&d));
    Ok(jwk)
}

fn algorithm_of(jwk: &Jwk) -> Result<KeyAlgorithm, CryptoError> {
    match (jwk.kty.as_str(), jwk.crv.as_str()) {
        ("OKP", "Ed25519") => Ok(KeyAlgorithm::Ed25519),
        ("OKP", "X25519") => Ok(KeyAlgorithm::X25519),
        ("EC", "P-256") => Ok(KeyAlgorithm::EcdsaP256),
        ("EC", "secp256k1") => Ok(KeyAlgorithm::EcdsaSecp256k1),
        (kty, crv) => Err(CryptoError::UnsupportedFormat(format!(
            "unsupported JWK kty/crv: {kty}/{crv}"
        ))),
    }
}

/// Imports the public half of a JWK.
pub fn import_public(jwk: &Jwk) -> Result<PublicKey, CryptoError> {
    let x = unb64("x", &jwk.x)?;
    match algorithm_of(jwk)? {
        KeyAlgorithm::Ed25519 => PublicKey::from_bytes(KeyAlgorithm::Ed25519, &x),
        KeyAlgorithm::X25519 => PublicKey::from_bytes(KeyAlgorithm::X25519, &x),
        alg @ (KeyAlgorithm::EcdsaP256 | KeyAlgorithm::EcdsaSecp256k1) => {
            let y = jwk
                .y
                .as_deref()
                .ok_or_else(|| CryptoError::InvalidInput("EC JWK missing y".to_string()))?;
            let point = ec_point(&x, &unb64("y", y)?)?;
            PublicKey::from_bytes(alg, &point)
        }
    }
}

/// Imports a full key pair from a JWK carrying a private value.
pub fn import_keypair(jwk: &Jwk) -> Result<KeyPair, CryptoError> {
    let d = jwk
        .d
        .as_deref()
        .ok_or_else(|| CryptoError::InvalidInput("JWK has no private value".to_string()))?;
    let d = Zeroizing::new(unb64("d", d)?);
    let keypair = match algorithm_of(jwk)? {
        KeyAlgorithm::Ed25519 => KeyPair::Ed25519(Ed25519KeyPair::from_seed(&d)?),
        KeyAlgorithm::X25519 => KeyPair::X25519(X25519KeyPair::from_secret_bytes(&d)?),
        KeyAlgorithm::EcdsaP256 => KeyPair::EcdsaP256(P256KeyPair::from_private_scalar(&d)?),
        KeyAlgorithm::EcdsaSecp256k1 => {
            KeyPair::EcdsaSecp256k1(Secp256k1KeyPair::from_private_scalar(&d)?)
        }
    };
    // The public fields, when present, must agree with the private value.
    let declared = import_public(jwk)?;
    let derived = keypair.public_key();
    let matches = match (&declared, &derived) {
        (PublicKey::EcdsaP256(_), PublicKey::EcdsaP256(_))
        | (PublicKey::EcdsaSecp256k1(_), PublicKey::EcdsaSecp256k1(_)) => {
            // Encodings may differ (compressed vs not); compare key ids of
            // the canonical compressed form instead.
            export_public(&declared)? == export_public(&derived)?
        }
        _ => declared == derived,
    };
    if !matches {
        return Err(CryptoError::InvalidKey(
            "JWK public fields do not match the private value".to_string(),
        ));
    }
    Ok(keypair)
}

/// Serializes a JWK to its JSON text form.
pub fn to_json(jwk: &Jwk) -> Result<String, CryptoError> {
    serde_json::to_string(jwk).map_err(|e| CryptoError::OperationFailed(e.to_string()))
}

/// Parses a JWK from JSON text.
pub fn from_json(text: &str) -> Result<Jwk, CryptoError> {
    serde_json::from_str(text).map_err(|e| CryptoError::InvalidInput(format!("bad JWK JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_all_algorithms() {
        for algorithm in [
            KeyAlgorithm::Ed25519,
            KeyAlgorithm::EcdsaP256,
            KeyAlgorithm::EcdsaSecp256k1,
            KeyAlgorithm::X25519,
        ] {
            let kp = KeyPair::generate(algorithm);
            let jwk = export_private(&kp).unwrap();
            let restored = import_keypair(&jwk).unwrap();
            assert_eq!(restored.key_id(), kp.key_id(), "{algorithm}");

            let public = import_public(&jwk).unwrap();
            assert_eq!(public.key_id(), kp.key_id(), "{algorithm}");
        }
    }

    #[test]
    fn json_round_trip_keeps_fields() {
        let kp = KeyPair::generate(KeyAlgorithm::EcdsaP256);
        let jwk = export_private(&kp).unwrap();
        let parsed = from_json(&to_json(&jwk).unwrap()).unwrap();
        assert_eq!(parsed, jwk);
        assert_eq!(parsed.kty, "EC");
        assert_eq!(parsed.crv, "P-256");
        assert!(parsed.y.is_some());
    }

    #[test]
    fn public_only_jwk_cannot_become_a_keypair() {
        let kp = KeyPair::generate(KeyAlgorithm::Ed25519);
        let jwk = export_public(&kp.public_key()).unwrap();
        assert!(import_keypair(&jwk).is_err());
    }

    #[test]
    fn mismatched_public_fields_rejected() {
        let a = KeyPair::generate(KeyAlgorithm::Ed25519);
        let b = KeyPair::generate(KeyAlgorithm::Ed25519);
        let mut jwk = export_private(&a).unwrap();
        jwk.x = export_public(&b.public_key()).unwrap().x;
        assert!(import_keypair(&jwk).is_err());
    }

    #[test]
    fn unknown_curves_rejected() {
        let jwk = Jwk {
            kty: "EC".into(),
            crv: "P-384".into(),
            x: String::new(),
            y: None,
            d: None,
            kid: None,
        };
        assert!(matches!(
            import_public(&jwk),
            Err(CryptoError::UnsupportedFormat(_))
        ));
    }
}
