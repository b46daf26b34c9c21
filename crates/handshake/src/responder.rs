// Path: crates/handshake/src/responder.rs
//! The responding side of the handshake.

use crate::context::{ack_tag, HandshakeContext, EXPORTER_LEN, EXPORT_CONTEXT};
use crate::peer::{ed25519_key_of, resolve_record};
use crate::wire::{HandshakeRequest, HandshakeResponse};
use hpke::{Deserializable, Kem as KemTrait, OpModeR};
use sage_api::resolver::AgentResolver;
use sage_crypto::keys::ed25519;
use sage_crypto::keys::x25519::X25519KeyPair;
use sage_crypto::KeyPair;
use sage_session::{derive_session_id, Role, SessionManager};
use sage_types::did::Did;
use sage_types::error::{CryptoError, HandshakeError};
use std::sync::Arc;
use zeroize::Zeroizing;

type Kem = hpke::kem::X25519HkdfSha256;
type Kdf = hpke::kdf::HkdfSha256;
type Aead = hpke::aead::ChaCha20Poly1305;

/// The responding agent's handshake endpoint.
pub struct HandshakeResponder {
    resolver: Arc<dyn AgentResolver>,
    identity: KeyPair,
    kem: X25519KeyPair,
    did: Did,
    sessions: Arc<SessionManager>,
}

impl HandshakeResponder {
    /// Builds a responder. `identity` must be the agent's Ed25519 signing
    /// key and `kem` the X25519 key published in its registry record.
    pub fn new(
        resolver: Arc<dyn AgentResolver>,
        identity: KeyPair,
        kem: X25519KeyPair,
        did: Did,
        sessions: Arc<SessionManager>,
    ) -> Result<Self, HandshakeError> {
        if !matches!(identity, KeyPair::Ed25519(_)) {
            return Err(HandshakeError::Crypto(CryptoError::InvalidKey(
                "handshake identity must be an Ed25519 key".to_string(),
            )));
        }
        Ok(Self {
            resolver,
            identity,
            kem,
            did,
            sessions,
        })
    }

    /// Handles an incoming request: authenticates the initiator, runs the
    /// HPKE receiver setup, derives the same exporter secret and session
    /// id, installs the session, and returns the signed confirmation.
    ///
    /// Every check runs before the session is installed, so a failed
    /// handshake leaves no state on this side.
    pub async fn handle_message(
        &self,
        request: &HandshakeRequest,
    ) -> Result<HandshakeResponse, HandshakeError> {
        if request.responder_did != self.did {
            return Err(HandshakeError::ResolverLookup(format!(
                "request addressed to {}, this agent is {}",
                request.responder_did, self.did
            )));
        }

        let context = HandshakeContext {
            context_id: request.context_id.clone(),
            initiator_did: request.initiator_did.clone(),
            responder_did: request.responder_did.clone(),
        };

        // Authenticate the initiator before touching any key material.
        let initiator_record =
            resolve_record(self.resolver.as_ref(), &request.initiator_did).await?;
        let initiator_ed25519 = ed25519_key_of(&initiator_record)?;
        ed25519::verify(
            &initiator_ed25519,
            &context.initiator_preimage(&request.enc),
            &request.sig,
        )
        .map_err(|_| HandshakeError::SignatureVerification)?;

        let sk = <Kem as KemTrait>::PrivateKey::from_bytes(&self.kem.secret_bytes())
            .map_err(|e| HandshakeError::Hpke(format!("bad local KEM key: {e}")))?;
        let encapped = <Kem as KemTrait>::EncappedKey::from_bytes(&request.enc)
            .map_err(|_| HandshakeError::KemDecapsulation)?;
        let info = context.info();
        let receiver_ctx =
            hpke::setup_receiver::<Aead, Kdf, Kem>(&OpModeR::Base, &sk, &encapped, info.as_bytes())
                .map_err(|_| HandshakeError::KemDecapsulation)?;

        let mut exporter_secret = Zeroizing::new([0u8; EXPORTER_LEN]);
        receiver_ctx
            .export(EXPORT_CONTEXT, exporter_secret.as_mut())
            .map_err(|e| HandshakeError::Hpke(format!("export failed: {e}")))?;

        let session_id = derive_session_id(exporter_secret.as_ref(), &context.context_id);
        let tag = ack_tag(exporter_secret.as_ref(), &session_id)?;
        let sig = self
            .identity
            .sign(&context.responder_preimage(&request.enc, &session_id, &tag))?;

        self.sessions
            .create(&session_id, exporter_secret.as_ref(), Role::Responder)?;
        log::info!(
            "[Handshake] accepted ctx={} from {} as session {}",
            context.context_id,
            context.initiator_did,
            session_id
        );

        Ok(HandshakeResponse {
            session_id,
            ack_tag: tag.to_vec(),
            sig,
        })
    }
}
