// Path: crates/handshake/src/context.rs
//! Handshake binding labels and derived secrets.

use hkdf::Hkdf;
use sage_types::codec::encode_framed;
use sage_types::did::Did;
use sage_types::error::HandshakeError;
use sha2::Sha256;

/// Version label prefix of the HPKE `info` string.
pub const INFO_LABEL: &str = "sage/hpke-handshake v1";
/// The exporter context for the session secret.
pub const EXPORT_CONTEXT: &[u8] = b"sage/session exporter v1";
/// HKDF label of the key-confirmation tag.
pub const ACK_LABEL: &[u8] = b"sage/ack v1";
/// Exporter secret length.
pub const EXPORTER_LEN: usize = 32;
/// Key-confirmation tag length.
pub const ACK_TAG_LEN: usize = 32;

/// The identity binding of one handshake attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeContext {
    /// Caller-chosen context id; a failed id is never retried.
    pub context_id: String,
    /// The initiating agent.
    pub initiator_did: Did,
    /// The responding agent.
    pub responder_did: Did,
}

impl HandshakeContext {
    /// The HPKE `info` string:
    /// `sage/hpke-handshake v1|ctx:<id>|init:<did>|resp:<did>`.
    ///
    /// Binding the exact peer pair and context into the KEM prevents
    /// unknown-key-share splices.
    pub fn info(&self) -> String {
        format!(
            "{INFO_LABEL}|ctx:{}|init:{}|resp:{}",
            self.context_id, self.initiator_did, self.responder_did
        )
    }

    /// The initiator's signing preimage: `context_id || enc || responder_did`.
    pub fn initiator_preimage(&self, encapped_key: &[u8]) -> Vec<u8> {
        encode_framed(&[
            self.context_id.as_bytes(),
            encapped_key,
            self.responder_did.to_string().as_bytes(),
        ])
    }

    /// The responder's signing preimage:
    /// `context_id || enc || session_id || ack_tag`.
    pub fn responder_preimage(
        &self,
        encapped_key: &[u8],
        session_id: &str,
        ack_tag: &[u8],
    ) -> Vec<u8> {
        encode_framed(&[
            self.context_id.as_bytes(),
            encapped_key,
            session_id.as_bytes(),
            ack_tag,
        ])
    }
}

/// Derives the key-confirmation tag:
/// `HKDF-Expand(exporter_secret, "sage/ack v1" || session_id, 32)`.
pub fn ack_tag(
    exporter_secret: &[u8],
    session_id: &str,
) -> Result<[u8; ACK_TAG_LEN], HandshakeError> {
    let hk = Hkdf::<Sha256>::from_prk(exporter_secret)
        .map_err(|_| HandshakeError::Hpke("exporter secret too short for HKDF".to_string()))?;
    let mut info = Vec::with_capacity(ACK_LABEL.len() + session_id.len());
    info.extend_from_slice(ACK_LABEL);
    info.extend_from_slice(session_id.as_bytes());
    let mut tag = [0u8; ACK_TAG_LEN];
    hk.expand(&info, &mut tag)
        .map_err(|e| HandshakeError::Hpke(e.to_string()))?;
    Ok(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sage_types::did::Network;

    fn context() -> HandshakeContext {
        HandshakeContext {
            context_id: "ctx-42".into(),
            initiator_did: Did::new(Network::Ethereum, "alice").unwrap(),
            responder_did: Did::new(Network::Ethereum, "bob").unwrap(),
        }
    }

    #[test]
    fn info_binds_all_three_identifiers() {
        let base = context().info();
        assert_eq!(
            base,
            "sage/hpke-handshake v1|ctx:ctx-42|init:did:sage:ethereum:alice|resp:did:sage:ethereum:bob"
        );

        let mut other = context();
        other.responder_did = Did::new(Network::Ethereum, "mallory").unwrap();
        assert_ne!(base, other.info());
    }

    #[test]
    fn ack_tag_depends_on_secret_and_session() {
        let a = ack_tag(&[1u8; 32], "session-1").unwrap();
        assert_eq!(a, ack_tag(&[1u8; 32], "session-1").unwrap());
        assert_ne!(a, ack_tag(&[2u8; 32], "session-1").unwrap());
        assert_ne!(a, ack_tag(&[1u8; 32], "session-2").unwrap());
    }

    #[test]
    fn preimages_are_framed() {
        let ctx = context();
        // Same concatenated bytes, different field boundaries.
        let a = ctx.initiator_preimage(b"abc");
        let mut other = ctx.clone();
        other.context_id = format!("{}a", ctx.context_id);
        let b = other.initiator_preimage(b"bc");
        assert_ne!(a, b);
    }
}
