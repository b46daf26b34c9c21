// Path: crates/rfc9421/src/wire.rs
//! Emission and parsing of the `Signature-Input` and `Signature` headers.
//!
//! One signature per message under a caller-chosen label (`sig1` by
//! default). The parser keeps the raw parameter serialization alongside the
//! parsed form so the verifier can reconstruct the signature base
//! byte-exactly.

use crate::component::ComponentId;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sage_types::error::SignatureError;
use sage_types::message::{SignatureAlgorithm, SignatureParameters};
use std::str::FromStr;

/// The header names this module owns.
pub const SIGNATURE_INPUT_HEADER: &str = "signature-input";
/// See [`SIGNATURE_INPUT_HEADER`].
pub const SIGNATURE_HEADER: &str = "signature";
/// The default signature label.
pub const DEFAULT_LABEL: &str = "sig1";

/// A parsed `Signature-Input` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSignatureInput {
    /// The signature label (`sig1`).
    pub label: String,
    /// The ordered covered components.
    pub components: Vec<ComponentId>,
    /// The parsed parameters.
    pub params: SignatureParameters,
    /// The raw inner serialization, verbatim, for base reconstruction.
    pub raw: String,
}

/// Builds the `Signature-Input` header value.
pub fn signature_input_value(label: &str, inner: &str) -> String {
    format!("{label}={inner}")
}

/// Builds the `Signature` header value (RFC 8941 byte sequence).
pub fn signature_value(label: &str, signature: &[u8]) -> String {
    format!("{label}=:{}:", STANDARD.encode(signature))
}

fn malformed(detail: impl Into<String>) -> SignatureError {
    SignatureError::MalformedHeader(detail.into())
}

/// Parses a `Signature-Input` header value.
pub fn parse_signature_input(value: &str) -> Result<ParsedSignatureInput, SignatureError> {
    let value = value.trim();
    let (label, inner) = value
        .split_once('=')
        .ok_or_else(|| malformed("Signature-Input has no label"))?;
    let label = label.trim();
    if label.is_empty() {
        return Err(malformed("empty signature label"));
    }

    let inner = inner.trim();
    let rest = inner
        .strip_prefix('(')
        .ok_or_else(|| malformed("expected component list"))?;
    let (list, params_text) = rest
        .split_once(')')
        .ok_or_else(|| malformed("unterminated component list"))?;

    let mut components = Vec::new();
    for item in list.split_whitespace() {
        let name = item
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .ok_or_else(|| malformed(format!("unquoted component {item:?}")))?;
        components.push(ComponentId::from_str(name)?);
    }

    let mut created: Option<u64> = None;
    let mut key_id: Option<String> = None;
    let mut algorithm: Option<SignatureAlgorithm> = None;
    let mut nonce: Option<String> = None;
    let mut expires: Option<u64> = None;

    for pair in params_text.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let (name, raw_value) = pair
            .split_once('=')
            .ok_or_else(|| malformed(format!("bad parameter {pair:?}")))?;
        let string_value = raw_value
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'));
        match name {
            "created" => {
                created = Some(
                    raw_value
                        .parse::<u64>()
                        .map_err(|_| malformed(format!("bad created value {raw_value:?}")))?,
                );
            }
            "expires" => {
                expires = Some(
                    raw_value
                        .parse::<u64>()
                        .map_err(|_| malformed(format!("bad expires value {raw_value:?}")))?,
                );
            }
            "keyid" => {
                key_id = Some(
                    string_value
                        .ok_or_else(|| malformed("keyid must be a quoted string"))?
                        .to_string(),
                );
            }
            "alg" => {
                let text = string_value.ok_or_else(|| malformed("alg must be a quoted string"))?;
                algorithm = Some(SignatureAlgorithm::from_str(text)?);
            }
            "nonce" => {
                nonce = Some(
                    string_value
                        .ok_or_else(|| malformed("nonce must be a quoted string"))?
                        .to_string(),
                );
            }
            // Unknown parameters are preserved through `raw` and otherwise
            // ignored.
            _ => {}
        }
    }

    let params = SignatureParameters {
        key_id: key_id.ok_or(SignatureError::MissingKeyId)?,
        algorithm: algorithm
            .ok_or_else(|| SignatureError::UnsupportedAlgorithm("<absent>".to_string()))?,
        created: created.ok_or_else(|| malformed("missing created parameter"))?,
        nonce,
        expires,
    };

    Ok(ParsedSignatureInput {
        label: label.to_string(),
        components,
        params,
        raw: inner.to_string(),
    })
}

/// Parses a `Signature` header value, returning `(label, bytes)`.
pub fn parse_signature(value: &str) -> Result<(String, Vec<u8>), SignatureError> {
    let value = value.trim();
    let (label, encoded) = value
        .split_once('=')
        .ok_or_else(|| malformed("Signature has no label"))?;
    let encoded = encoded
        .strip_prefix(':')
        .and_then(|s| s.strip_suffix(':'))
        .ok_or_else(|| malformed("Signature is not a byte sequence"))?;
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| malformed(format!("bad signature base64: {e}")))?;
    Ok((label.trim().to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_round_trip() {
        let value = "sig1=(\"@method\" \"@path\");created=1618884473;\
                     keyid=\"did:sage:ethereum:a\";alg=\"ed25519\";nonce=\"n-1\";expires=99";
        let parsed = parse_signature_input(value).unwrap();
        assert_eq!(parsed.label, "sig1");
        assert_eq!(
            parsed.components,
            vec![ComponentId::Method, ComponentId::Path]
        );
        assert_eq!(parsed.params.created, 1_618_884_473);
        assert_eq!(parsed.params.key_id, "did:sage:ethereum:a");
        assert_eq!(parsed.params.algorithm, SignatureAlgorithm::Ed25519);
        assert_eq!(parsed.params.nonce.as_deref(), Some("n-1"));
        assert_eq!(parsed.params.expires, Some(99));
        assert_eq!(signature_input_value(&parsed.label, &parsed.raw), value);
    }

    #[test]
    fn signature_round_trip() {
        let value = signature_value("sig1", &[1, 2, 3, 255]);
        let (label, bytes) = parse_signature(&value).unwrap();
        assert_eq!(label, "sig1");
        assert_eq!(bytes, vec![1, 2, 3, 255]);
    }

    #[test]
    fn missing_keyid_is_typed() {
        let value = "sig1=(\"@method\");created=1;alg=\"ed25519\"";
        assert!(matches!(
            parse_signature_input(value),
            Err(SignatureError::MissingKeyId)
        ));
    }

    #[test]
    fn unknown_alg_is_typed() {
        let value = "sig1=(\"@method\");created=1;keyid=\"k\";alg=\"hmac-sha256\"";
        assert!(matches!(
            parse_signature_input(value),
            Err(SignatureError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        for bad in [
            "",
            "sig1=@method",
            "sig1=(\"@method\"",
            "sig1=(@method);created=1;keyid=\"k\";alg=\"ed25519\"",
            "sig1=(\"@method\");created=soon;keyid=\"k\";alg=\"ed25519\"",
        ] {
            assert!(parse_signature_input(bad).is_err(), "accepted {bad:?}");
        }
        assert!(parse_signature("sig1=abc").is_err());
    }
}
