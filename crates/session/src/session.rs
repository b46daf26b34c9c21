// Path: crates/session/src/session.rs
//! One AEAD session between two peers.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use hkdf::Hkdf;
use sage_types::config::SessionConfig;
use sage_types::error::SessionError;
use sha2::{Digest, Sha256};
use std::sync::Mutex;
use std::time::Instant;
use zeroize::Zeroizing;

/// HKDF expansion label for the AEAD key.
const AEAD_KEY_LABEL: &[u8] = b"sage/aead v1";
/// HKDF expansion label for the nonce base.
const NONCE_BASE_LABEL: &[u8] = b"sage/nonce v1";

/// AEAD nonce length.
const NONCE_LEN: usize = 12;
/// AEAD tag length.
const TAG_LEN: usize = 16;
/// Length of a session id string.
pub const SESSION_ID_LEN: usize = 22;

/// Which side of the handshake this session instance speaks for. The role
/// sets the direction bit in outgoing nonces, so the two peers can never
/// reuse a nonce against the shared key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The handshake initiator.
    Initiator,
    /// The handshake responder.
    Responder,
}

impl Role {
    fn direction_bit(self) -> u8 {
        match self {
            Role::Initiator => 0x80,
            Role::Responder => 0x00,
        }
    }

    fn peer(self) -> Role {
        match self {
            Role::Initiator => Role::Responder,
            Role::Responder => Role::Initiator,
        }
    }
}

/// Derives the deterministic session id:
/// `base64url(SHA-256(exporter_secret || context_id)[..16])`, 22 chars.
pub fn derive_session_id(exporter_secret: &[u8], context_id: &str) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    let mut hasher = Sha256::new();
    hasher.update(exporter_secret);
    hasher.update(context_id.as_bytes());
    let digest = hasher.finalize();
    URL_SAFE_NO_PAD.encode(digest.get(..16).unwrap_or_default())
}

#[derive(Debug)]
struct SessionState {
    last_used_at: Instant,
    send_counter: u64,
    message_count: u64,
    expired: bool,
}

/// A live AEAD session.
///
/// Encrypt/decrypt take `&self`; an internal lock serializes senders so the
/// outgoing counter is strictly monotonic.
pub struct SecureSession {
    session_id: String,
    cipher: ChaCha20Poly1305,
    nonce_base: [u8; NONCE_LEN],
    role: Role,
    config: SessionConfig,
    created_at: Instant,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for SecureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureSession")
            .field("session_id", &self.session_id)
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl SecureSession {
    /// Derives a session from a 32-byte exporter secret.
    ///
    /// `aead_key = HKDF-Expand(exporter, "sage/aead v1", 32)` and the
    /// 12-byte nonce base comes from its own expansion label.
    pub fn from_exporter(
        exporter_secret: &[u8],
        session_id: String,
        role: Role,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let hk = Hkdf::<Sha256>::from_prk(exporter_secret)
            .map_err(|_| SessionError::KeyDerivation("exporter secret too short".to_string()))?;
        let mut key = Zeroizing::new([0u8; 32]);
        hk.expand(AEAD_KEY_LABEL, key.as_mut())
            .map_err(|e| SessionError::KeyDerivation(e.to_string()))?;
        let mut nonce_base = [0u8; NONCE_LEN];
        hk.expand(NONCE_BASE_LABEL, &mut nonce_base)
            .map_err(|e| SessionError::KeyDerivation(e.to_string()))?;

        Ok(Self {
            session_id,
            cipher: ChaCha20Poly1305::new(Key::from_slice(key.as_ref())),
            nonce_base,
            role,
            config,
            created_at: Instant::now(),
            state: Mutex::new(SessionState {
                last_used_at: Instant::now(),
                send_counter: 0,
                message_count: 0,
                expired: false,
            }),
        })
    }

    /// The 22-character session id.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// This side's role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Messages processed so far (both directions).
    pub fn message_count(&self) -> u64 {
        self.state.lock().map(|s| s.message_count).unwrap_or(0)
    }

    fn expired_locked(&self, state: &mut SessionState) -> bool {
        if state.expired {
            return true;
        }
        let now = Instant::now();
        let done = now.duration_since(self.created_at) > self.config.max_age()
            || now.duration_since(state.last_used_at) > self.config.idle_timeout()
            || state.message_count >= self.config.max_messages;
        if done {
            state.expired = true;
        }
        done
    }

    /// Whether the session has hit any of its limits. Computed lazily; an
    /// expired session never un-expires.
    pub fn is_expired(&self) -> bool {
        match self.state.lock() {
            Ok(mut state) => self.expired_locked(&mut state),
            Err(_) => true,
        }
    }

    /// The nonce for `counter` in the given direction: the base XORed with
    /// the little-endian counter, direction bit in the top bit of the last
    /// byte.
    fn nonce_for(&self, counter: u64, direction: Role) -> [u8; NONCE_LEN] {
        let mut nonce = self.nonce_base;
        for (n, c) in nonce.iter_mut().zip(counter.to_le_bytes()) {
            *n ^= c;
        }
        if let Some(last) = nonce.last_mut() {
            *last ^= direction.direction_bit();
        }
        nonce
    }

    fn aad_for(&self, counter: u64) -> Vec<u8> {
        let mut aad = Vec::with_capacity(self.session_id.len() + 8);
        aad.extend_from_slice(self.session_id.as_bytes());
        aad.extend_from_slice(&counter.to_be_bytes());
        aad
    }

    /// Encrypts a message, producing the `nonce || ct || tag` frame.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, SessionError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| SessionError::Aead)?;
        if self.expired_locked(&mut state) {
            return Err(SessionError::Expired);
        }

        let counter = state.send_counter;
        let nonce = self.nonce_for(counter, self.role);
        let aad = self.aad_for(counter);
        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: &aad,
                },
            )
            .map_err(|_| SessionError::Aead)?;

        state.send_counter += 1;
        state.message_count += 1;
        state.last_used_at = Instant::now();

        let mut frame = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        frame.extend_from_slice(&nonce);
        frame.extend_from_slice(&ciphertext);
        Ok(frame)
    }

    /// Decrypts a peer frame.
    pub fn decrypt(&self, frame: &[u8]) -> Result<Vec<u8>, SessionError> {
        if frame.len() < NONCE_LEN + TAG_LEN {
            return Err(SessionError::MalformedFrame(format!(
                "frame of {} bytes is below the {} byte minimum",
                frame.len(),
                NONCE_LEN + TAG_LEN
            )));
        }
        let (nonce, ciphertext) = frame.split_at(NONCE_LEN);

        let mut state = self
            .state
            .lock()
            .map_err(|_| SessionError::Aead)?;
        if self.expired_locked(&mut state) {
            return Err(SessionError::Expired);
        }

        // Recover the peer counter from the nonce, then require the whole
        // nonce to be well-formed for that counter and direction.
        let mut counter_bytes = [0u8; 8];
        for ((c, n), b) in counter_bytes
            .iter_mut()
            .zip(nonce.iter().copied())
            .zip(self.nonce_base)
        {
            *c = n ^ b;
        }
        let counter = u64::from_le_bytes(counter_bytes);
        let expected = self.nonce_for(counter, self.role.peer());
        if expected.as_slice() != nonce {
            return Err(SessionError::Aead);
        }

        let aad = self.aad_for(counter);
        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: &aad,
                },
            )
            .map_err(|_| SessionError::Aead)?;

        state.message_count += 1;
        state.last_used_at = Instant::now();
        Ok(plaintext)
    }
}
