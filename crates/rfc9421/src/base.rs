// Path: crates/rfc9421/src/base.rs
//! Canonical signature-base construction (RFC 9421 §2.3).
//!
//! The base is a line-oriented byte string: one `"identifier": value` line
//! per covered component, then the `"@signature-params"` line carrying the
//! exact parameter serialization that also rides in `Signature-Input`.
//! Re-serializing the same inputs must yield a byte-identical base; every
//! ordering and casing rule here exists to keep that property.

use crate::component::ComponentId;
use sage_types::error::SignatureError;
use sage_types::message::SignatureParameters;
use crate::message::HttpMessage;

/// Serializes the inner value of `Signature-Input`: the component list and
/// the ordered parameters
/// `("c1" "c2");created=...;keyid="...";alg="..."[;nonce="..."][;expires=...]`.
pub fn serialize_params(components: &[ComponentId], params: &SignatureParameters) -> String {
    let list = components
        .iter()
        .map(|c| format!("\"{}\"", c.name()))
        .collect::<Vec<_>>()
        .join(" ");
    let mut out = format!(
        "({list});created={};keyid=\"{}\";alg=\"{}\"",
        params.created,
        params.key_id,
        params.algorithm.as_str()
    );
    if let Some(nonce) = &params.nonce {
        out.push_str(&format!(";nonce=\"{nonce}\""));
    }
    if let Some(expires) = params.expires {
        out.push_str(&format!(";expires={expires}"));
    }
    out
}

/// Builds the canonical signature base for a message.
///
/// `params_serialization` is the exact inner value of `Signature-Input` —
/// on the signing side the output of [`serialize_params`], on the verifying
/// side the received text verbatim, so reconstruction is deterministic even
/// for parameter serializations this implementation would not itself emit.
pub fn build_signature_base(
    message: &HttpMessage,
    components: &[ComponentId],
    params_serialization: &str,
) -> Result<String, SignatureError> {
    let mut seen: Vec<&ComponentId> = Vec::with_capacity(components.len());
    let mut base = String::new();
    for component in components {
        if seen.contains(&component) {
            return Err(SignatureError::AmbiguousComponent(format!(
                "{} is covered twice",
                component.name()
            )));
        }
        seen.push(component);
        let value = component.resolve(message)?;
        base.push_str(&format!("\"{}\": {}\n", component.name(), value));
    }
    base.push_str(&format!("\"@signature-params\": {params_serialization}"));
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sage_types::message::SignatureAlgorithm;

    fn message() -> HttpMessage {
        let mut m = HttpMessage::new("GET", "sage.dev", "/resource/123");
        m.query = Some("user=alice".into());
        m.push_header("Host", "sage.dev");
        m.push_header("Date", "Tue, 20 Apr 2021 02:07:55 GMT");
        m
    }

    fn params() -> SignatureParameters {
        SignatureParameters {
            key_id: "did:sage:ethereum:agent-1".into(),
            algorithm: SignatureAlgorithm::Ed25519,
            created: 1_618_884_473,
            nonce: None,
            expires: None,
        }
    }

    #[test]
    fn base_layout_matches_rfc_shape() {
        let components = vec![
            ComponentId::Method,
            ComponentId::Path,
            ComponentId::Query,
            ComponentId::header("host"),
        ];
        let serialization = serialize_params(&components, &params());
        let base = build_signature_base(&message(), &components, &serialization).unwrap();
        let expected = concat!(
            "\"@method\": GET\n",
            "\"@path\": /resource/123\n",
            "\"@query\": ?user=alice\n",
            "\"host\": sage.dev\n",
            "\"@signature-params\": (\"@method\" \"@path\" \"@query\" \"host\")",
            ";created=1618884473;keyid=\"did:sage:ethereum:agent-1\";alg=\"ed25519\"",
        );
        assert_eq!(base, expected);
    }

    #[test]
    fn base_is_deterministic() {
        let components = vec![ComponentId::Method, ComponentId::header("date")];
        let serialization = serialize_params(&components, &params());
        let a = build_signature_base(&message(), &components, &serialization).unwrap();
        let b = build_signature_base(&message(), &components, &serialization).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn optional_params_serialize_in_order() {
        let mut p = params();
        p.nonce = Some("nAnLbQTxYlXOQC9VgZ-uWg".into());
        p.expires = Some(1_618_884_773);
        let text = serialize_params(&[ComponentId::Method], &p);
        assert_eq!(
            text,
            "(\"@method\");created=1618884473;keyid=\"did:sage:ethereum:agent-1\";\
             alg=\"ed25519\";nonce=\"nAnLbQTxYlXOQC9VgZ-uWg\";expires=1618884773"
        );
    }

    #[test]
    fn duplicate_coverage_is_ambiguous() {
        let components = vec![ComponentId::Method, ComponentId::Method];
        let serialization = serialize_params(&components, &params());
        assert!(matches!(
            build_signature_base(&message(), &components, &serialization),
            Err(SignatureError::AmbiguousComponent(_))
        ));
    }

    #[test]
    fn missing_component_fails_construction() {
        let components = vec![ComponentId::header("content-digest")];
        let serialization = serialize_params(&components, &params());
        assert!(matches!(
            build_signature_base(&message(), &components, &serialization),
            Err(SignatureError::MissingComponent(_))
        ));
    }
}
