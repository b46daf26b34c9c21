// Path: crates/rfc9421/src/signer.rs
//! The signing entry point: builds the base, signs it, and attaches the
//! two signature headers.

use crate::base::{build_signature_base, serialize_params};
use crate::component::ComponentId;
use crate::message::HttpMessage;
use crate::wire::{
    signature_input_value, signature_value, DEFAULT_LABEL, SIGNATURE_HEADER,
    SIGNATURE_INPUT_HEADER,
};
use sage_crypto::KeyPair;
use sage_types::error::{CryptoError, SignatureError};
use sage_types::message::{KeyAlgorithm, SignatureAlgorithm, SignatureParameters};

/// How to sign a message.
#[derive(Debug, Clone)]
pub struct SignatureOptions {
    /// Signature label; `sig1` unless several signatures must coexist.
    pub label: String,
    /// The ordered covered components.
    pub components: Vec<ComponentId>,
    /// The `keyid` to state; for agent messages this is the signer's DID.
    pub key_id: String,
    /// Creation time override (unix seconds); now when absent.
    pub created: Option<u64>,
    /// Single-use token to bind into the signature.
    pub nonce: Option<String>,
    /// Expiry (unix seconds), if the signature should age out.
    pub expires: Option<u64>,
}

impl SignatureOptions {
    /// Options covering the given components under the given key id.
    pub fn new(key_id: impl Into<String>, components: Vec<ComponentId>) -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            components,
            key_id: key_id.into(),
            created: None,
            nonce: None,
            expires: None,
        }
    }
}

/// The `alg` parameter a key pair produces.
pub(crate) fn algorithm_for(key: KeyAlgorithm) -> Result<SignatureAlgorithm, SignatureError> {
    match key {
        KeyAlgorithm::Ed25519 => Ok(SignatureAlgorithm::Ed25519),
        KeyAlgorithm::EcdsaP256 => Ok(SignatureAlgorithm::Es256),
        KeyAlgorithm::EcdsaSecp256k1 => Ok(SignatureAlgorithm::Es256k),
        KeyAlgorithm::X25519 => Err(SignatureError::Crypto(CryptoError::KemOnlyKey)),
    }
}

pub(crate) fn unix_now_secs() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Signs `message`, attaching `Signature-Input` and `Signature` headers.
///
/// Body coverage is the caller's choice: attach a `content-digest` header
/// (see [`crate::digest`]) and include it in the covered components.
pub fn sign(
    message: &mut HttpMessage,
    keypair: &KeyPair,
    options: SignatureOptions,
) -> Result<SignatureParameters, SignatureError> {
    let params = SignatureParameters {
        key_id: options.key_id,
        algorithm: algorithm_for(keypair.algorithm())?,
        created: options.created.unwrap_or_else(unix_now_secs),
        nonce: options.nonce,
        expires: options.expires,
    };
    if params.key_id.is_empty() {
        return Err(SignatureError::MissingKeyId);
    }

    let serialization = serialize_params(&options.components, &params);
    let base = build_signature_base(message, &options.components, &serialization)?;
    let signature = keypair.sign(base.as_bytes())?;

    message.set_header(
        SIGNATURE_INPUT_HEADER,
        signature_input_value(&options.label, &serialization),
    );
    message.set_header(SIGNATURE_HEADER, signature_value(&options.label, &signature));
    log::debug!(
        "[rfc9421] signed {} {} as {} ({})",
        message.method,
        message.path,
        params.key_id,
        params.algorithm
    );
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{parse_signature, parse_signature_input};

    #[test]
    fn emitted_headers_parse_back() {
        let mut m = HttpMessage::new("GET", "sage.dev", "/resource/123");
        m.query = Some("user=alice".into());
        m.push_header("Date", "Tue, 20 Apr 2021 02:07:55 GMT");

        let kp = KeyPair::generate(KeyAlgorithm::Ed25519);
        let options = SignatureOptions::new(
            "did:sage:ethereum:agent-1",
            vec![ComponentId::Method, ComponentId::Path, ComponentId::Query],
        );
        let params = sign(&mut m, &kp, options).unwrap();
        assert_eq!(params.algorithm, SignatureAlgorithm::Ed25519);

        let input = parse_signature_input(&m.canonical_header("signature-input").unwrap()).unwrap();
        assert_eq!(input.params, params);
        let (label, bytes) = parse_signature(&m.canonical_header("signature").unwrap()).unwrap();
        assert_eq!(label, "sig1");
        assert_eq!(bytes.len(), 64);
    }

    #[test]
    fn x25519_keys_cannot_sign_messages() {
        let mut m = HttpMessage::new("GET", "sage.dev", "/");
        let kp = KeyPair::generate(KeyAlgorithm::X25519);
        let options = SignatureOptions::new("kid", vec![ComponentId::Method]);
        assert!(matches!(
            sign(&mut m, &kp, options),
            Err(SignatureError::Crypto(CryptoError::KemOnlyKey))
        ));
    }

    #[test]
    fn empty_key_id_is_rejected() {
        let mut m = HttpMessage::new("GET", "sage.dev", "/");
        let kp = KeyPair::generate(KeyAlgorithm::Ed25519);
        let options = SignatureOptions::new("", vec![ComponentId::Method]);
        assert!(matches!(
            sign(&mut m, &kp, options),
            Err(SignatureError::MissingKeyId)
        ));
    }
}
