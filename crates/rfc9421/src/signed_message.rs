// Path: crates/rfc9421/src/signed_message.rs
//! Signing for the structured application-message shape.
//!
//! A [`SignedMessage`] is the transport-free counterpart of a signed HTTP
//! request: named fields instead of components, the same canonical
//! line-based base, the same parameter serialization, the signer's DID as
//! `keyid`, and the header nonce bound in as the signature nonce.

use crate::base::serialize_params;
use crate::component::ComponentId;
use crate::signer::{algorithm_for, unix_now_secs};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sage_api::resolver::KeyResolver;
use sage_crypto::{KeyPair, PublicKey};
use sage_types::error::{CryptoError, SignatureError};
use sage_types::message::{MessageHeader, SignatureParameters, SignedMessage};

fn field_value(
    field: &str,
    header: &MessageHeader,
    body: &[u8],
) -> Result<String, SignatureError> {
    match field {
        "agent_did" => Ok(header.agent_did.to_string()),
        "message_id" => Ok(header.message_id.clone()),
        "timestamp" => Ok(header.timestamp_ms.to_string()),
        "nonce" => Ok(header.nonce.clone()),
        "sequence" => Ok(header.sequence.to_string()),
        "body" => Ok(URL_SAFE_NO_PAD.encode(body)),
        other => Err(SignatureError::MissingComponent(format!(
            "unknown signed field {other:?}"
        ))),
    }
}

fn build_field_base(
    fields: &[String],
    header: &MessageHeader,
    body: &[u8],
    params_serialization: &str,
) -> Result<String, SignatureError> {
    let mut base = String::new();
    let mut seen: Vec<&str> = Vec::with_capacity(fields.len());
    for field in fields {
        if seen.contains(&field.as_str()) {
            return Err(SignatureError::AmbiguousComponent(format!(
                "{field} is covered twice"
            )));
        }
        seen.push(field);
        base.push_str(&format!(
            "\"{}\": {}\n",
            field,
            field_value(field, header, body)?
        ));
    }
    base.push_str(&format!("\"@signature-params\": {params_serialization}"));
    Ok(base)
}

fn components_for(fields: &[String]) -> Vec<ComponentId> {
    // Field names are plain identifiers; reusing the header-component
    // serialization keeps the params line format identical to HTTP.
    fields.iter().map(|f| ComponentId::header(f)).collect()
}

/// Signs a structured message over the given field set (the default set
/// when `signed_fields` is `None`).
pub fn sign_message(
    keypair: &KeyPair,
    header: MessageHeader,
    body: Vec<u8>,
    signed_fields: Option<Vec<String>>,
    expires: Option<u64>,
) -> Result<SignedMessage, SignatureError> {
    let signed_fields = signed_fields.unwrap_or_else(SignedMessage::default_signed_fields);
    let params = SignatureParameters {
        key_id: header.agent_did.to_string(),
        algorithm: algorithm_for(keypair.algorithm())?,
        created: unix_now_secs(),
        nonce: Some(header.nonce.clone()),
        expires,
    };
    let serialization = serialize_params(&components_for(&signed_fields), &params);
    let base = build_field_base(&signed_fields, &header, &body, &serialization)?;
    let signature = keypair.sign(base.as_bytes())?;
    Ok(SignedMessage {
        header,
        body,
        signed_fields,
        signature_params: params,
        signature,
    })
}

/// Verifies a structured message's signature and its internal consistency.
///
/// Freshness (replay, ordering, dedupe) is the validator pipeline's job;
/// this checks that the signature covers what the message claims and was
/// produced by the `keyid` agent's key.
pub async fn verify_message(
    message: &SignedMessage,
    resolver: &dyn KeyResolver,
) -> Result<(), SignatureError> {
    let params = &message.signature_params;
    if params.key_id.is_empty() {
        return Err(SignatureError::MissingKeyId);
    }
    if params.key_id != message.header.agent_did.to_string() {
        return Err(SignatureError::Crypto(CryptoError::InvalidInput(format!(
            "keyid {} does not match sender {}",
            params.key_id, message.header.agent_did
        ))));
    }
    if params.nonce.as_deref() != Some(message.header.nonce.as_str()) {
        return Err(SignatureError::Crypto(CryptoError::InvalidInput(
            "signature nonce does not match header nonce".to_string(),
        )));
    }

    let resolved = resolver
        .resolve_key(&params.key_id)
        .await
        .map_err(|e| SignatureError::KeyResolution(e.to_string()))?;
    let expected = algorithm_for(resolved.algorithm)?;
    if expected != params.algorithm {
        return Err(SignatureError::Crypto(CryptoError::InvalidKey(format!(
            "keyid resolves to {} but signature states {}",
            expected, params.algorithm
        ))));
    }

    let serialization = serialize_params(&components_for(&message.signed_fields), params);
    let base = build_field_base(
        &message.signed_fields,
        &message.header,
        &message.body,
        &serialization,
    )?;
    PublicKey::from_bytes(resolved.algorithm, &resolved.public_key)?
        .verify(base.as_bytes(), &message.signature)
        .map_err(|_| SignatureError::Crypto(CryptoError::InvalidSignature))
}
