// Path: crates/rfc9421/src/component.rs
//! Covered-component identifiers.
//!
//! A component is either a derived pseudo-component (`@method`, `@path`,
//! `@query`, `@authority`, `@target-uri`) or a message header named in
//! lower case. `@signature-params` is appended by the base builder itself
//! and is not a coverable component.

use crate::message::HttpMessage;
use sage_types::error::SignatureError;
use std::fmt;
use std::str::FromStr;

/// One covered component of a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComponentId {
    /// `@method`: the request method.
    Method,
    /// `@path`: the absolute path.
    Path,
    /// `@query`: the query string including the leading `?`.
    Query,
    /// `@authority`: host and optional port.
    Authority,
    /// `@target-uri`: the full request URI.
    TargetUri,
    /// A message header, stored lower-case.
    Header(String),
}

impl ComponentId {
    /// Builds a header component, lower-casing the name.
    pub fn header(name: &str) -> Self {
        ComponentId::Header(name.to_ascii_lowercase())
    }

    /// The identifier as it appears (unquoted) in the signature base.
    pub fn name(&self) -> &str {
        match self {
            ComponentId::Method => "@method",
            ComponentId::Path => "@path",
            ComponentId::Query => "@query",
            ComponentId::Authority => "@authority",
            ComponentId::TargetUri => "@target-uri",
            ComponentId::Header(name) => name,
        }
    }

    /// Resolves the component's canonical value from a message.
    ///
    /// Fails with [`SignatureError::MissingComponent`] when the component
    /// is absent, so a signer cannot cover a field the verifier would not
    /// see.
    pub fn resolve(&self, message: &HttpMessage) -> Result<String, SignatureError> {
        let missing = || SignatureError::MissingComponent(self.name().to_string());
        match self {
            ComponentId::Method => {
                if message.method.is_empty() {
                    Err(missing())
                } else {
                    Ok(message.method.to_ascii_uppercase())
                }
            }
            ComponentId::Path => {
                if message.path.is_empty() {
                    Err(missing())
                } else {
                    Ok(message.path.clone())
                }
            }
            ComponentId::Query => message.query_component().ok_or_else(missing),
            ComponentId::Authority => {
                if message.authority.is_empty() {
                    Err(missing())
                } else {
                    Ok(message.authority.to_ascii_lowercase())
                }
            }
            ComponentId::TargetUri => message.target_uri(),
            ComponentId::Header(name) => message.canonical_header(name).ok_or_else(missing),
        }
    }
}

impl FromStr for ComponentId {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "@method" => Ok(ComponentId::Method),
            "@path" => Ok(ComponentId::Path),
            "@query" => Ok(ComponentId::Query),
            "@authority" => Ok(ComponentId::Authority),
            "@target-uri" => Ok(ComponentId::TargetUri),
            other if other.starts_with('@') => Err(SignatureError::MalformedHeader(format!(
                "unknown derived component {other:?}"
            ))),
            other if other.is_empty() => Err(SignatureError::MalformedHeader(
                "empty component identifier".to_string(),
            )),
            other => Ok(ComponentId::header(other)),
        }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_round_trip() {
        for name in ["@method", "@path", "@query", "@authority", "@target-uri", "date"] {
            let c: ComponentId = name.parse().unwrap();
            assert_eq!(c.name(), name);
        }
        assert_eq!(
            "Content-Digest".parse::<ComponentId>().unwrap(),
            ComponentId::header("content-digest")
        );
        assert!("@unknown".parse::<ComponentId>().is_err());
    }

    #[test]
    fn resolution_uses_canonical_forms() {
        let mut m = HttpMessage::new("get", "SAGE.dev", "/r");
        m.query = Some("a=1".into());
        m.push_header("Date", "Tue, 20 Apr 2021 02:07:55 GMT");

        assert_eq!(ComponentId::Method.resolve(&m).unwrap(), "GET");
        assert_eq!(ComponentId::Authority.resolve(&m).unwrap(), "sage.dev");
        assert_eq!(ComponentId::Query.resolve(&m).unwrap(), "?a=1");
        assert_eq!(
            ComponentId::header("DATE").resolve(&m).unwrap(),
            "Tue, 20 Apr 2021 02:07:55 GMT"
        );
    }

    #[test]
    fn absent_components_fail() {
        let m = HttpMessage::new("GET", "sage.dev", "/r");
        assert!(matches!(
            ComponentId::Query.resolve(&m),
            Err(SignatureError::MissingComponent(_))
        ));
        assert!(matches!(
            ComponentId::header("date").resolve(&m),
            Err(SignatureError::MissingComponent(_))
        ));
    }
}
