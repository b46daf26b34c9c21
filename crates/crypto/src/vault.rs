// Path: crates/crypto/src/vault.rs
//! Encrypted at-rest storage for key pairs.
//!
//! Format V1:
//! [ Magic: "SAGEKEY1" (8) ]
//! [ Version: u8 (1) ]
//! [ Salt: 32B ]
//! [ IV: 12B ]
//! [ Ciphertext + Tag: N + 16 ]
//!
//! KEK = PBKDF2-HMAC-SHA-256(passphrase, salt, iterations); payload sealed
//! with AES-256-GCM. Files are written 0600 and replaced atomically via a
//! temp-file rename. This is the only supported at-rest format for ECDSA
//! keys (PEM is Ed25519-only).

use crate::error::{CryptoError, VaultError};
use crate::keys::{
    ed25519::Ed25519KeyPair, p256::P256KeyPair, secp256k1::Secp256k1KeyPair,
    x25519::X25519KeyPair, KeyPair,
};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sage_types::message::KeyAlgorithm;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

const MAGIC: &[u8; 8] = b"SAGEKEY1";
const VERSION: u8 = 1;
const SALT_LEN: usize = 32;
const IV_LEN: usize = 12;
const KEK_LEN: usize = 32;
const HEADER_LEN: usize = 8 + 1 + SALT_LEN + IV_LEN; // 53 bytes

/// Default PBKDF2 iteration count.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

/// The serialized form of a key pair inside the sealed payload.
#[derive(Serialize, Deserialize)]
struct VaultPayload {
    algorithm: KeyAlgorithm,
    /// Private bytes, base64url: Ed25519 uses the 64-byte `seed || public`
    /// form, the other algorithms their 32-byte secret.
    private: String,
}

fn derive_kek(passphrase: &str, salt: &[u8], iterations: u32) -> Zeroizing<[u8; KEK_LEN]> {
    let mut kek = Zeroizing::new([0u8; KEK_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, iterations, kek.as_mut());
    kek
}

/// Seals raw payload bytes under a passphrase, producing a V1 vault blob.
pub fn seal(payload: &[u8], passphrase: &str, iterations: u32) -> Result<Vec<u8>, VaultError> {
    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut iv);

    let kek = derive_kek(passphrase, &salt, iterations);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(kek.as_ref()));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), payload)
        .map_err(|_| VaultError::Crypto(CryptoError::OperationFailed("AEAD seal failed".into())))?;

    let mut out = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Opens a V1 vault blob. Authentication failure maps to
/// [`VaultError::WrongPassphrase`] — a tampered file and a wrong passphrase
/// are indistinguishable by design of the AEAD.
pub fn open(blob: &[u8], passphrase: &str, iterations: u32) -> Result<Zeroizing<Vec<u8>>, VaultError> {
    if blob.len() < HEADER_LEN {
        return Err(VaultError::InvalidFormat("file too short".into()));
    }
    let (magic, rest) = blob.split_at(8);
    if magic != MAGIC {
        return Err(VaultError::InvalidFormat("bad file signature".into()));
    }
    let (version, rest) = rest.split_at(1);
    if version != [VERSION] {
        return Err(VaultError::InvalidFormat(format!(
            "unsupported vault version {:?}",
            version.first()
        )));
    }
    let (salt, rest) = rest.split_at(SALT_LEN);
    let (iv, ciphertext) = rest.split_at(IV_LEN);

    let kek = derive_kek(passphrase, salt, iterations);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(kek.as_ref()));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| VaultError::WrongPassphrase)?;
    Ok(Zeroizing::new(plaintext))
}

/// A directory-backed vault of passphrase-encrypted key pairs, one file per
/// key id.
pub struct KeyVault {
    dir: PathBuf,
    iterations: u32,
}

impl KeyVault {
    /// Opens a vault rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>, iterations: u32) -> Result<Self, VaultError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, iterations })
    }

    fn path_for(&self, key_id: &str) -> Result<PathBuf, VaultError> {
        // Key ids are base64url; anything else is refused rather than
        // letting a caller-controlled id traverse the filesystem.
        if key_id.is_empty()
            || !key_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(VaultError::InvalidFormat(format!(
                "invalid key id {key_id:?}"
            )));
        }
        Ok(self.dir.join(format!("{key_id}.sage")))
    }

    /// Encrypts and stores a key pair under `key_id`.
    pub fn save(
        &self,
        key_id: &str,
        keypair: &KeyPair,
        passphrase: &str,
    ) -> Result<PathBuf, VaultError> {
        let private: Zeroizing<Vec<u8>> = match keypair {
            KeyPair::Ed25519(kp) => Zeroizing::new(kp.to_keypair_bytes().to_vec()),
            KeyPair::EcdsaP256(kp) => Zeroizing::new(kp.private_scalar().to_vec()),
            KeyPair::EcdsaSecp256k1(kp) => Zeroizing::new(kp.private_scalar().to_vec()),
            KeyPair::X25519(kp) => Zeroizing::new(kp.secret_bytes().to_vec()),
        };
        let payload = VaultPayload {
            algorithm: keypair.algorithm(),
            private: URL_SAFE_NO_PAD.encode(&private),
        };
        let payload_bytes = Zeroizing::new(
            serde_json::to_vec(&payload)
                .map_err(|e| VaultError::Crypto(CryptoError::OperationFailed(e.to_string())))?,
        );

        let blob = seal(&payload_bytes, passphrase, self.iterations)?;
        let path = self.path_for(key_id)?;
        write_atomic(&path, &blob)?;
        log::debug!("[KeyVault] stored {} ({})", key_id, keypair.algorithm());
        Ok(path)
    }

    /// Loads and decrypts the key pair stored under `key_id`.
    pub fn load(&self, key_id: &str, passphrase: &str) -> Result<KeyPair, VaultError> {
        let path = self.path_for(key_id)?;
        let blob = std::fs::read(&path)?;
        let plaintext = open(&blob, passphrase, self.iterations)?;
        let payload: VaultPayload = serde_json::from_slice(&plaintext)
            .map_err(|e| VaultError::InvalidFormat(format!("bad vault payload: {e}")))?;
        let private = Zeroizing::new(
            URL_SAFE_NO_PAD
                .decode(&payload.private)
                .map_err(|e| VaultError::InvalidFormat(format!("bad private encoding: {e}")))?,
        );
        let keypair = match payload.algorithm {
            KeyAlgorithm::Ed25519 => KeyPair::Ed25519(Ed25519KeyPair::from_keypair_bytes(&private)?),
            KeyAlgorithm::EcdsaP256 => {
                KeyPair::EcdsaP256(P256KeyPair::from_private_scalar(&private)?)
            }
            KeyAlgorithm::EcdsaSecp256k1 => {
                KeyPair::EcdsaSecp256k1(Secp256k1KeyPair::from_private_scalar(&private)?)
            }
            KeyAlgorithm::X25519 => KeyPair::X25519(X25519KeyPair::from_secret_bytes(&private)?),
        };
        Ok(keypair)
    }

    /// Removes the stored key, if present.
    pub fn remove(&self, key_id: &str) -> Result<(), VaultError> {
        let path = self.path_for(key_id)?;
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Writes `data` to `path` atomically: temp file in the same directory,
/// 0600, fsync, rename.
fn write_atomic(path: &Path, data: &[u8]) -> Result<(), VaultError> {
    use std::io::Write;

    let tmp = path.with_extension("sage.tmp");
    {
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}
