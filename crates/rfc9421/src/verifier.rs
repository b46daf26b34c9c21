// Path: crates/rfc9421/src/verifier.rs
//! The verification entry point.
//!
//! Reconstructs the signature base deterministically from the stated
//! covered components, enforces the freshness parameters, resolves the
//! stated `keyid`, and dispatches on `alg`. When a `nonce` parameter is
//! present and a nonce ledger is attached, the nonce is consumed only
//! after the signature itself verifies.

use crate::base::build_signature_base;
use crate::component::ComponentId;
use crate::digest::{check_content_digest, CONTENT_DIGEST_HEADER};
use crate::message::HttpMessage;
use crate::signer::{algorithm_for, unix_now_secs};
use crate::wire::{parse_signature, parse_signature_input, SIGNATURE_HEADER, SIGNATURE_INPUT_HEADER};
use sage_api::resolver::KeyResolver;
use sage_crypto::address::ethereum_address;
use sage_crypto::PublicKey;
use sage_types::config::ValidatorConfig;
use sage_types::error::{CryptoError, SignatureError};
use sage_types::message::{SignatureAlgorithm, SignatureParameters};
use sage_validation::NonceManager;
use std::sync::Arc;

/// The header agents use to pin their Ethereum account; when covered by an
/// `es256k` signature the verifier re-derives the address from the signing
/// key and requires consistency.
pub const ETHEREUM_ADDRESS_HEADER: &str = "x-ethereum-address";

/// A configured verifier.
pub struct Verifier {
    tolerance_secs: u64,
    nonces: Option<Arc<NonceManager>>,
}

impl Verifier {
    /// Builds a verifier with the given skew tolerance for `created`.
    pub fn new(config: &ValidatorConfig) -> Self {
        Self {
            tolerance_secs: config.timestamp_tolerance_secs,
            nonces: None,
        }
    }

    /// Attaches a nonce ledger; signatures carrying a `nonce` parameter
    /// then become single-use.
    pub fn with_nonce_manager(mut self, nonces: Arc<NonceManager>) -> Self {
        self.nonces = Some(nonces);
        self
    }

    /// Verifies the message's signature, returning the accepted parameters.
    pub async fn verify(
        &self,
        message: &HttpMessage,
        resolver: &dyn KeyResolver,
    ) -> Result<SignatureParameters, SignatureError> {
        let input_value = message
            .canonical_header(SIGNATURE_INPUT_HEADER)
            .ok_or_else(|| {
                SignatureError::MalformedHeader("missing Signature-Input header".to_string())
            })?;
        let signature_header = message.canonical_header(SIGNATURE_HEADER).ok_or_else(|| {
            SignatureError::MalformedHeader("missing Signature header".to_string())
        })?;

        let input = parse_signature_input(&input_value)?;
        let (signature_label, signature) = parse_signature(&signature_header)?;
        if signature_label != input.label {
            return Err(SignatureError::MalformedHeader(format!(
                "label mismatch: input {:?} vs signature {:?}",
                input.label, signature_label
            )));
        }

        // Freshness parameters.
        let now = unix_now_secs();
        let delta_secs = now.abs_diff(input.params.created);
        if delta_secs > self.tolerance_secs {
            return Err(SignatureError::CreatedSkew { delta_secs });
        }
        if let Some(expires) = input.params.expires {
            if expires <= now {
                return Err(SignatureError::Expired { expires });
            }
        }

        // Replay gate. The nonce is only consumed after full verification.
        if let (Some(nonces), Some(nonce)) = (&self.nonces, &input.params.nonce) {
            if nonces.is_used(nonce) {
                return Err(sage_types::error::ValidationError::Replay(nonce.clone()).into());
            }
        }

        // Resolve and cross-check the stated key.
        let resolved = resolver
            .resolve_key(&input.params.key_id)
            .await
            .map_err(|e| SignatureError::KeyResolution(e.to_string()))?;
        let expected = algorithm_for(resolved.algorithm)?;
        if expected != input.params.algorithm {
            return Err(SignatureError::Crypto(CryptoError::InvalidKey(format!(
                "keyid resolves to {} but signature states {}",
                expected, input.params.algorithm
            ))));
        }
        let public = PublicKey::from_bytes(resolved.algorithm, &resolved.public_key)?;

        // When the body is covered, it must still match its stated digest.
        if input
            .components
            .iter()
            .any(|c| *c == ComponentId::header(CONTENT_DIGEST_HEADER))
        {
            check_content_digest(message)?;
        }

        let base = build_signature_base(message, &input.components, &input.raw)?;
        public
            .verify(base.as_bytes(), &signature)
            .map_err(|_| SignatureError::Crypto(CryptoError::InvalidSignature))?;

        // Ethereum binding: a covered x-ethereum-address header must match
        // the address the secp256k1 signing key derives to.
        if input.params.algorithm == SignatureAlgorithm::Es256k
            && input
                .components
                .iter()
                .any(|c| *c == ComponentId::header(ETHEREUM_ADDRESS_HEADER))
        {
            let stated = message
                .canonical_header(ETHEREUM_ADDRESS_HEADER)
                .ok_or_else(|| {
                    SignatureError::MissingComponent(ETHEREUM_ADDRESS_HEADER.to_string())
                })?;
            let derived = ethereum_address(&public)?.to_checksum_string();
            if !stated.eq_ignore_ascii_case(&derived) {
                return Err(SignatureError::Crypto(CryptoError::InvalidKey(format!(
                    "{ETHEREUM_ADDRESS_HEADER} is {stated} but the signing key derives {derived}"
                ))));
            }
        }

        // Consume the nonce last so a failed signature never burns it.
        if let (Some(nonces), Some(nonce)) = (&self.nonces, &input.params.nonce) {
            nonces.mark_used(nonce)?;
        }

        Ok(input.params)
    }
}

/// One-shot verification with default tolerances and no replay ledger.
pub async fn verify(
    message: &HttpMessage,
    resolver: &dyn KeyResolver,
) -> Result<SignatureParameters, SignatureError> {
    Verifier::new(&ValidatorConfig::default())
        .verify(message, resolver)
        .await
}
