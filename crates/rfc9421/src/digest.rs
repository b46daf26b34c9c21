// Path: crates/rfc9421/src/digest.rs
//! `Content-Digest` helpers (RFC 9530) for covering the body.
//!
//! The signature base can only cover header fields and derived components,
//! so body integrity rides in a `content-digest` header the caller covers
//! like any other field. SHA-256 is the only digest emitted here.

use crate::message::HttpMessage;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sage_types::error::SignatureError;
use sha2::{Digest, Sha256};

/// The header name.
pub const CONTENT_DIGEST_HEADER: &str = "content-digest";

/// Computes the `content-digest` value for a body: `sha-256=:base64:`.
pub fn content_digest_value(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    format!("sha-256=:{}:", STANDARD.encode(digest))
}

/// Sets the message's `content-digest` header from its current body.
pub fn attach_content_digest(message: &mut HttpMessage) {
    let value = content_digest_value(&message.body);
    message.set_header(CONTENT_DIGEST_HEADER, value);
}

/// Recomputes the digest over the message body and compares it to the
/// `content-digest` header, if one is present.
pub fn check_content_digest(message: &HttpMessage) -> Result<(), SignatureError> {
    let Some(stated) = message.canonical_header(CONTENT_DIGEST_HEADER) else {
        return Ok(());
    };
    let computed = content_digest_value(&message.body);
    if stated != computed {
        return Err(SignatureError::Crypto(
            sage_types::error::CryptoError::InvalidInput(
                "content-digest does not match body".to_string(),
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_matches_known_vector() {
        // SHA-256 of the empty string.
        assert_eq!(
            content_digest_value(b""),
            "sha-256=:47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=:"
        );
    }

    #[test]
    fn attach_then_check_round_trips() {
        let mut m = HttpMessage::new("POST", "sage.dev", "/transaction");
        m.body = br#"{"amount":100}"#.to_vec();
        attach_content_digest(&mut m);
        check_content_digest(&m).unwrap();

        m.body = br#"{"amount":999}"#.to_vec();
        assert!(check_content_digest(&m).is_err());
    }

    #[test]
    fn absent_header_is_not_checked() {
        let m = HttpMessage::new("GET", "sage.dev", "/");
        check_content_digest(&m).unwrap();
    }
}
