// Path: crates/types/src/codec.rs

//! Defines the canonical, deterministic byte framing used everywhere a hash
//! or signing preimage is computed over structured data.
//!
//! By centralizing the framing here in the base `types` crate, every
//! component produces the exact same bytes for the same logical value, so
//! commitment hashes, agent ids, and update-message digests computed by a
//! client always match the ones recomputed by a verifier.

/// Encodes a sequence of byte fields into one deterministic buffer.
///
/// Each field is framed as `len(u32 BE) || bytes`, which makes the encoding
/// unambiguous: `("ab", "c")` and `("a", "bc")` produce different buffers.
pub fn encode_framed(fields: &[&[u8]]) -> Vec<u8> {
    let total: usize = fields.iter().map(|f| 4 + f.len()).sum();
    let mut out = Vec::with_capacity(total);
    for field in fields {
        out.extend_from_slice(&(field.len() as u32).to_be_bytes());
        out.extend_from_slice(field);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_is_unambiguous() {
        let a = encode_framed(&[b"ab", b"c"]);
        let b = encode_framed(&[b"a", b"bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn framing_is_deterministic() {
        let fields: [&[u8]; 3] = [b"did:sage:ethereum:x", b"\x01\x02", b""];
        assert_eq!(encode_framed(&fields), encode_framed(&fields));
    }

    #[test]
    fn layout_matches_expectation() {
        let out = encode_framed(&[b"hi"]);
        assert_eq!(out, vec![0, 0, 0, 2, b'h', b'i']);
    }
}
