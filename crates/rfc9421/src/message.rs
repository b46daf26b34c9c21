// Path: crates/rfc9421/src/message.rs
//! The abstract HTTP message the engine signs and verifies.
//!
//! Transport adapters map their request type onto this view; the engine
//! never touches a socket. Header lookup is case-insensitive and multiple
//! values fold into one comma-separated value, as the signature base
//! requires.

use sage_types::error::SignatureError;

/// An HTTP-style message: request line parts, headers, body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpMessage {
    /// Request method (`GET`, `POST`, ...).
    pub method: String,
    /// URI scheme, used only by `@target-uri`.
    pub scheme: String,
    /// Host (and optional port), the `@authority` component.
    pub authority: String,
    /// Absolute path, the `@path` component.
    pub path: String,
    /// Query string without the leading `?`, if any.
    pub query: Option<String>,
    /// Header fields in arrival order. Names need not be lower-case.
    pub headers: Vec<(String, String)>,
    /// Message body.
    pub body: Vec<u8>,
}

impl HttpMessage {
    /// Starts a message with the request-target parts filled in.
    pub fn new(
        method: impl Into<String>,
        authority: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            scheme: "https".into(),
            authority: authority.into(),
            path: path.into(),
            query: None,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Appends a header field.
    pub fn push_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Looks up a header case-insensitively, folding repeated fields into
    /// one comma-separated value with whitespace trimmed, per the
    /// canonicalization the signature base requires.
    pub fn canonical_header(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.trim())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    /// Replaces every instance of a header with a single value.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }

    /// The `@query` component value: the query string with its leading `?`.
    pub fn query_component(&self) -> Option<String> {
        self.query.as_ref().map(|q| format!("?{q}"))
    }

    /// The `@target-uri` component value.
    pub fn target_uri(&self) -> Result<String, SignatureError> {
        if self.scheme.is_empty() || self.authority.is_empty() {
            return Err(SignatureError::MissingComponent("@target-uri".to_string()));
        }
        let query = self
            .query
            .as_ref()
            .map(|q| format!("?{q}"))
            .unwrap_or_default();
        Ok(format!(
            "{}://{}{}{}",
            self.scheme, self.authority, self.path, query
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_folding_is_case_insensitive_and_ordered() {
        let mut m = HttpMessage::new("GET", "sage.dev", "/");
        m.push_header("X-Tag", " a ");
        m.push_header("x-tag", "b");
        assert_eq!(m.canonical_header("X-TAG").unwrap(), "a, b");
        assert_eq!(m.canonical_header("missing"), None);
    }

    #[test]
    fn target_uri_assembles_all_parts() {
        let mut m = HttpMessage::new("GET", "sage.dev", "/resource/123");
        m.query = Some("user=alice".into());
        assert_eq!(
            m.target_uri().unwrap(),
            "https://sage.dev/resource/123?user=alice"
        );
        assert_eq!(m.query_component().unwrap(), "?user=alice");
    }

    #[test]
    fn set_header_replaces_every_instance() {
        let mut m = HttpMessage::new("GET", "sage.dev", "/");
        m.push_header("Date", "old");
        m.push_header("date", "older");
        m.set_header("Date", "new");
        assert_eq!(m.canonical_header("date").unwrap(), "new");
    }
}
