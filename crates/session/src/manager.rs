// Path: crates/session/src/manager.rs
//! Ownership and lifecycle of live sessions.

use crate::session::{derive_session_id, Role, SecureSession};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sage_types::config::SessionConfig;
use sage_types::error::SessionError;
use sage_validation::sweeper::{self, SweeperHandle};
use std::sync::Arc;
use std::time::Duration;
use zeroize::Zeroizing;

/// Everything needed to (re-)derive a session deterministically.
///
/// The session id is a pure function of these parameters, which is what
/// makes [`SessionManager::ensure_session_with_params`] idempotent.
pub struct SessionParams {
    /// The 32-byte HPKE exporter secret.
    pub exporter_secret: Zeroizing<[u8; 32]>,
    /// The handshake context id.
    pub context_id: String,
    /// Which side this manager speaks for.
    pub role: Role,
}

impl SessionParams {
    /// The session id these parameters derive to.
    pub fn session_id(&self) -> String {
        derive_session_id(self.exporter_secret.as_ref(), &self.context_id)
    }
}

/// Owns every live session. Callers hold `Arc` handles; expired records
/// are garbage-collected on access and by [`SessionManager::cleanup_expired`].
pub struct SessionManager {
    sessions: DashMap<String, Arc<SecureSession>>,
    config: SessionConfig,
}

impl SessionManager {
    /// Builds a manager applying `config` to every new session.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
        }
    }

    /// Creates a session under an explicit id, failing on collision.
    pub fn create(
        &self,
        session_id: &str,
        exporter_secret: &[u8],
        role: Role,
    ) -> Result<Arc<SecureSession>, SessionError> {
        match self.sessions.entry(session_id.to_string()) {
            Entry::Occupied(entry) => {
                // A dead record under this id is replaceable.
                if entry.get().is_expired() {
                    let session = Arc::new(SecureSession::from_exporter(
                        exporter_secret,
                        session_id.to_string(),
                        role,
                        self.config,
                    )?);
                    let mut entry = entry;
                    entry.insert(Arc::clone(&session));
                    Ok(session)
                } else {
                    Err(SessionError::Duplicate(session_id.to_string()))
                }
            }
            Entry::Vacant(entry) => {
                let session = Arc::new(SecureSession::from_exporter(
                    exporter_secret,
                    session_id.to_string(),
                    role,
                    self.config,
                )?);
                entry.insert(Arc::clone(&session));
                log::debug!("[SessionManager] installed session {session_id}");
                Ok(session)
            }
        }
    }

    /// Looks up a live session. Expired records are removed and report
    /// [`SessionError::NotFound`].
    pub fn get(&self, session_id: &str) -> Result<Arc<SecureSession>, SessionError> {
        let session = self
            .sessions
            .get(session_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        if session.is_expired() {
            self.sessions.remove(session_id);
            return Err(SessionError::NotFound(session_id.to_string()));
        }
        Ok(session)
    }

    /// Drops a session.
    pub fn remove(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    /// Idempotent session establishment: derives the id from `params` and
    /// returns `(session, existed)`. A second call with identical
    /// parameters returns the live session without re-deriving keys.
    pub fn ensure_session_with_params(
        &self,
        params: &SessionParams,
    ) -> Result<(Arc<SecureSession>, bool), SessionError> {
        let session_id = params.session_id();
        match self.get(&session_id) {
            Ok(existing) => Ok((existing, true)),
            Err(SessionError::NotFound(_)) => {
                match self.create(&session_id, params.exporter_secret.as_ref(), params.role) {
                    Ok(session) => Ok((session, false)),
                    // Lost a race against an identical ensure; use the winner.
                    Err(SessionError::Duplicate(_)) => Ok((self.get(&session_id)?, true)),
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Removes every expired session, returning the count removed.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired());
        before.saturating_sub(self.sessions.len())
    }

    /// Number of tracked (possibly expired-but-unswept) sessions.
    pub fn live_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Starts a periodic sweeper over the session table.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> SweeperHandle {
        let this = Arc::clone(self);
        sweeper::spawn("SessionManager", interval, move || this.cleanup_expired())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    fn params(context_id: &str) -> SessionParams {
        let mut secret = Zeroizing::new([0u8; 32]);
        rand::rngs::OsRng.fill_bytes(secret.as_mut());
        SessionParams {
            exporter_secret: secret,
            context_id: context_id.to_string(),
            role: Role::Initiator,
        }
    }

    #[test]
    fn create_get_remove_lifecycle() {
        let manager = SessionManager::new(SessionConfig::default());
        let p = params("ctx");
        let id = p.session_id();
        manager
            .create(&id, p.exporter_secret.as_ref(), Role::Initiator)
            .unwrap();
        assert!(manager.get(&id).is_ok());
        assert!(matches!(
            manager.create(&id, p.exporter_secret.as_ref(), Role::Initiator),
            Err(SessionError::Duplicate(_))
        ));
        manager.remove(&id);
        assert!(matches!(manager.get(&id), Err(SessionError::NotFound(_))));
    }

    #[test]
    fn ensure_is_idempotent() {
        let manager = SessionManager::new(SessionConfig::default());
        let p = params("ctx");
        let (first, existed) = manager.ensure_session_with_params(&p).unwrap();
        assert!(!existed);
        let (second, existed) = manager.ensure_session_with_params(&p).unwrap();
        assert!(existed);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.live_sessions(), 1);
    }

    #[test]
    fn expired_sessions_vanish_on_get_and_sweep() {
        let config = SessionConfig {
            idle_timeout_ms: 50,
            ..SessionConfig::default()
        };
        let manager = SessionManager::new(config);
        let p = params("ctx");
        let id = p.session_id();
        let session = manager
            .create(&id, p.exporter_secret.as_ref(), Role::Initiator)
            .unwrap();

        std::thread::sleep(std::time::Duration::from_millis(70));
        assert_eq!(session.encrypt(b"late"), Err(SessionError::Expired));
        assert!(matches!(manager.get(&id), Err(SessionError::NotFound(_))));
        assert_eq!(manager.cleanup_expired(), 0); // already collected by get
        assert_eq!(manager.live_sessions(), 0);
    }

    #[test]
    fn cleanup_counts_swept_sessions() {
        let config = SessionConfig {
            idle_timeout_ms: 10,
            ..SessionConfig::default()
        };
        let manager = SessionManager::new(config);
        for i in 0..3 {
            let p = params(&format!("ctx-{i}"));
            manager
                .create(&p.session_id(), p.exporter_secret.as_ref(), Role::Initiator)
                .unwrap();
        }
        std::thread::sleep(std::time::Duration::from_millis(30));
        assert_eq!(manager.cleanup_expired(), 3);
        assert_eq!(manager.live_sessions(), 0);
    }

    #[tokio::test]
    async fn sweeper_collects_in_background() {
        let config = SessionConfig {
            idle_timeout_ms: 10,
            ..SessionConfig::default()
        };
        let manager = Arc::new(SessionManager::new(config));
        let p = params("ctx");
        manager
            .create(&p.session_id(), p.exporter_secret.as_ref(), Role::Initiator)
            .unwrap();

        let handle = manager.spawn_sweeper(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(manager.live_sessions(), 0);
        handle.shutdown().await;
    }
}
