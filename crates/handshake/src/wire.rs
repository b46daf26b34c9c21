// Path: crates/handshake/src/wire.rs
//! Handshake wire messages.
//!
//! Both messages are serde structs with base64url byte fields, so they ride
//! equally well in JSON bodies or any other transport envelope; the
//! transport itself is out of scope here.

use sage_types::did::Did;
use sage_types::error::HandshakeError;
use serde::{Deserialize, Serialize};

/// Base64url (unpadded) serde adapter for byte fields.
mod b64 {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        URL_SAFE_NO_PAD
            .decode(text.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Initiator -> responder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeRequest {
    /// The caller-chosen context id.
    pub context_id: String,
    /// The initiating agent.
    pub initiator_did: Did,
    /// The intended responder.
    pub responder_did: Did,
    /// The 32-byte HPKE encapsulated key.
    #[serde(with = "b64")]
    pub enc: Vec<u8>,
    /// The initiator's signature over `context_id || enc || responder_did`.
    #[serde(with = "b64")]
    pub sig: Vec<u8>,
}

/// Responder -> initiator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeResponse {
    /// The derived 22-character session id.
    pub session_id: String,
    /// The 32-byte key-confirmation tag.
    #[serde(with = "b64")]
    pub ack_tag: Vec<u8>,
    /// The responder's Ed25519 signature over
    /// `context_id || enc || session_id || ack_tag`.
    #[serde(with = "b64")]
    pub sig: Vec<u8>,
}

impl HandshakeRequest {
    /// Serializes to the JSON wire form.
    pub fn to_json(&self) -> Result<String, HandshakeError> {
        serde_json::to_string(self).map_err(|e| HandshakeError::MalformedMessage(e.to_string()))
    }

    /// Parses the JSON wire form.
    pub fn from_json(text: &str) -> Result<Self, HandshakeError> {
        serde_json::from_str(text).map_err(|e| HandshakeError::MalformedMessage(e.to_string()))
    }
}

impl HandshakeResponse {
    /// Serializes to the JSON wire form.
    pub fn to_json(&self) -> Result<String, HandshakeError> {
        serde_json::to_string(self).map_err(|e| HandshakeError::MalformedMessage(e.to_string()))
    }

    /// Parses the JSON wire form.
    pub fn from_json(text: &str) -> Result<Self, HandshakeError> {
        serde_json::from_str(text).map_err(|e| HandshakeError::MalformedMessage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sage_types::did::Network;

    #[test]
    fn request_json_round_trip() {
        let request = HandshakeRequest {
            context_id: "ctx".into(),
            initiator_did: Did::new(Network::Ethereum, "alice").unwrap(),
            responder_did: Did::new(Network::Ethereum, "bob").unwrap(),
            enc: vec![7u8; 32],
            sig: vec![9u8; 64],
        };
        let json = request.to_json().unwrap();
        // DIDs serialize as plain strings, bytes as base64url.
        assert!(json.contains("\"did:sage:ethereum:alice\""));
        assert!(!json.contains('['));
        assert_eq!(HandshakeRequest::from_json(&json).unwrap(), request);
    }

    #[test]
    fn response_json_round_trip() {
        let response = HandshakeResponse {
            session_id: "s".repeat(22),
            ack_tag: vec![1u8; 32],
            sig: vec![2u8; 64],
        };
        let json = response.to_json().unwrap();
        assert_eq!(HandshakeResponse::from_json(&json).unwrap(), response);
    }

    #[test]
    fn malformed_json_is_typed() {
        assert!(matches!(
            HandshakeRequest::from_json("{]"),
            Err(HandshakeError::MalformedMessage(_))
        ));
    }
}
