// Path: crates/handshake/src/initiator.rs
//! The initiating side of the handshake.

use crate::context::{ack_tag, HandshakeContext, EXPORTER_LEN, EXPORT_CONTEXT};
use crate::peer::{ed25519_key_of, kem_key_of, resolve_record};
use crate::wire::{HandshakeRequest, HandshakeResponse};
use hpke::{Deserializable, Kem as KemTrait, OpModeS, Serializable};
use rand::rngs::OsRng;
use sage_api::resolver::AgentResolver;
use sage_crypto::keys::ed25519;
use sage_crypto::KeyPair;
use sage_session::{derive_session_id, Role, SecureSession, SessionManager};
use sage_types::did::Did;
use sage_types::error::{CryptoError, HandshakeError};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

type Kem = hpke::kem::X25519HkdfSha256;
type Kdf = hpke::kdf::HkdfSha256;
type Aead = hpke::aead::ChaCha20Poly1305;

/// State the initiator holds between sending the request and accepting the
/// response. Dropping it abandons the attempt; no session exists yet.
#[derive(Debug)]
pub struct PendingHandshake {
    context: HandshakeContext,
    encapped_key: Vec<u8>,
    exporter_secret: Zeroizing<[u8; EXPORTER_LEN]>,
    session_id: String,
}

impl PendingHandshake {
    /// The locally derived session id the responder must agree on.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// The initiating agent's handshake endpoint.
pub struct HandshakeInitiator {
    resolver: Arc<dyn AgentResolver>,
    identity: KeyPair,
    did: Did,
    sessions: Arc<SessionManager>,
    attempted: Mutex<HashSet<String>>,
}

impl HandshakeInitiator {
    /// Builds an initiator. `identity` must be the agent's Ed25519 signing
    /// key, matching its registry record.
    pub fn new(
        resolver: Arc<dyn AgentResolver>,
        identity: KeyPair,
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
            did,
            sessions,
            attempted: Mutex::new(HashSet::new()),
        })
    }

    /// Starts a handshake towards `responder_did` under a fresh context id.
    ///
    /// Resolves the responder's X25519 key, runs the HPKE sender setup with
    /// the identity-binding `info`, exports the session secret, and signs
    /// the request. A context id can be attempted at most once.
    pub async fn initiate(
        &self,
        context_id: &str,
        responder_did: &Did,
    ) -> Result<(HandshakeRequest, PendingHandshake), HandshakeError> {
        {
            let mut attempted = self
                .attempted
                .lock()
                .map_err(|_| HandshakeError::Hpke("initiator state poisoned".to_string()))?;
            if !attempted.insert(context_id.to_string()) {
                return Err(HandshakeError::MalformedMessage(format!(
                    "context {context_id} was already attempted"
                )));
            }
        }

        let context = HandshakeContext {
            context_id: context_id.to_string(),
            initiator_did: self.did.clone(),
            responder_did: responder_did.clone(),
        };

        let responder_record = resolve_record(self.resolver.as_ref(), responder_did).await?;
        let responder_kem = kem_key_of(&responder_record)?;
        let responder_pk = <Kem as KemTrait>::PublicKey::from_bytes(&responder_kem)
            .map_err(|e| HandshakeError::Hpke(format!("bad responder KEM key: {e}")))?;

        let info = context.info();
        let (encapped, sender_ctx) = hpke::setup_sender::<Aead, Kdf, Kem, _>(
            &OpModeS::Base,
            &responder_pk,
            info.as_bytes(),
            &mut OsRng,
        )
        .map_err(|e| HandshakeError::Hpke(format!("sender setup failed: {e}")))?;

        let mut exporter_secret = Zeroizing::new([0u8; EXPORTER_LEN]);
        sender_ctx
            .export(EXPORT_CONTEXT, exporter_secret.as_mut())
            .map_err(|e| HandshakeError::Hpke(format!("export failed: {e}")))?;

        let encapped_key = encapped.to_bytes().to_vec();
        let session_id = derive_session_id(exporter_secret.as_ref(), &context.context_id);
        let sig = self
            .identity
            .sign(&context.initiator_preimage(&encapped_key))?;

        let request = HandshakeRequest {
            context_id: context.context_id.clone(),
            initiator_did: context.initiator_did.clone(),
            responder_did: context.responder_did.clone(),
            enc: encapped_key.clone(),
            sig,
        };
        log::debug!(
            "[Handshake] initiated ctx={} resp={} session={}",
            context.context_id,
            context.responder_did,
            session_id
        );
        Ok((
            request,
            PendingHandshake {
                context,
                encapped_key,
                exporter_secret,
                session_id,
            },
        ))
    }

    /// Accepts the responder's answer: recomputes the ack tag locally and
    /// compares in constant time (an adversary who substituted the
    /// responder's KEM key diverges here), verifies the responder's
    /// signature against its DID-resolved Ed25519 key, and only then
    /// installs the session.
    pub async fn finalize(
        &self,
        pending: PendingHandshake,
        response: &HandshakeResponse,
    ) -> Result<Arc<SecureSession>, HandshakeError> {
        if response.session_id != pending.session_id {
            return Err(HandshakeError::AckTagMismatch);
        }
        let expected = ack_tag(pending.exporter_secret.as_ref(), &pending.session_id)?;
        if !bool::from(expected.as_slice().ct_eq(response.ack_tag.as_slice())) {
            return Err(HandshakeError::AckTagMismatch);
        }

        let responder_record =
            resolve_record(self.resolver.as_ref(), &pending.context.responder_did).await?;
        let responder_ed25519 = ed25519_key_of(&responder_record)?;
        let preimage = pending.context.responder_preimage(
            &pending.encapped_key,
            &pending.session_id,
            &expected,
        );
        ed25519::verify(&responder_ed25519, &preimage, &response.sig)
            .map_err(|_| HandshakeError::SignatureVerification)?;

        let session = self.sessions.create(
            &pending.session_id,
            pending.exporter_secret.as_ref(),
            Role::Initiator,
        )?;
        log::info!(
            "[Handshake] established session {} with {}",
            pending.session_id,
            pending.context.responder_did
        );
        Ok(session)
    }
}
