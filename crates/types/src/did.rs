// Path: crates/types/src/did.rs

//! Defines the canonical DID string form `did:sage:<network>:<identifier>`
//! and the single parser used to interpret it.
//!
//! This module is the source of truth for agent identity syntax. Network
//! aliases (`eth`, `sol`) are canonicalised at parse time so the rest of the
//! workspace only ever sees [`Network::Ethereum`] or [`Network::Solana`].

use crate::error::DidError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The DID method name used by SAGE.
pub const DID_METHOD: &str = "sage";

/// The blockchain network a DID is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Ethereum mainnet or an EVM-compatible deployment.
    Ethereum,
    /// Solana.
    Solana,
}

impl Network {
    /// Returns the canonical lower-case network name used in DID strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::Solana => "solana",
        }
    }
}

impl FromStr for Network {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ethereum" | "eth" => Ok(Network::Ethereum),
            "solana" | "sol" => Ok(Network::Solana),
            other => Err(DidError::UnsupportedNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed SAGE DID.
///
/// The identifier segment is an opaque non-empty string. Newly issued DIDs
/// use UUID v4 identifiers (see [`Did::generate`]), but the parser accepts
/// any opaque value so externally issued identities resolve cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did {
    network: Network,
    identifier: String,
}

impl Did {
    /// Builds a DID from its parts, validating the identifier is non-empty.
    pub fn new(network: Network, identifier: impl Into<String>) -> Result<Self, DidError> {
        let identifier = identifier.into();
        if identifier.is_empty() {
            return Err(DidError::Invalid("empty identifier".to_string()));
        }
        Ok(Self {
            network,
            identifier,
        })
    }

    /// Issues a fresh DID on the given network with a UUID v4 identifier.
    pub fn generate(network: Network) -> Self {
        Self {
            network,
            identifier: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// The network segment.
    pub fn network(&self) -> Network {
        self.network
    }

    /// The opaque identifier segment.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl FromStr for Did {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(4, ':');
        let scheme = parts.next().unwrap_or_default();
        let method = parts.next().unwrap_or_default();
        let network = parts.next().unwrap_or_default();
        let identifier = parts.next().unwrap_or_default();

        if scheme != "did" {
            return Err(DidError::Invalid(format!("missing `did:` scheme in {s:?}")));
        }
        if method != DID_METHOD {
            return Err(DidError::Invalid(format!(
                "unsupported method {method:?}, expected {DID_METHOD:?}"
            )));
        }
        let network = Network::from_str(network)?;
        Did::new(network, identifier)
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "did:{}:{}:{}", DID_METHOD, self.network, self.identifier)
    }
}

impl TryFrom<String> for Did {
    type Error = DidError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_canonical_form() {
        let did: Did = "did:sage:ethereum:3f2a8e44-1111-4222-8333-abcdefabcdef"
            .parse()
            .unwrap();
        assert_eq!(did.network(), Network::Ethereum);
        assert_eq!(did.identifier(), "3f2a8e44-1111-4222-8333-abcdefabcdef");
    }

    #[test]
    fn aliases_canonicalise() {
        let did: Did = "did:sage:eth:abc".parse().unwrap();
        assert_eq!(did.network(), Network::Ethereum);
        assert_eq!(did.to_string(), "did:sage:ethereum:abc");

        let did: Did = "did:sage:sol:xyz".parse().unwrap();
        assert_eq!(did.network(), Network::Solana);
        assert_eq!(did.to_string(), "did:sage:solana:xyz");
    }

    #[test]
    fn opaque_identifiers_accepted() {
        // Any non-empty opaque string after the network segment is valid,
        // including ones containing further colons.
        let did: Did = "did:sage:ethereum:urn:agent:42".parse().unwrap();
        assert_eq!(did.identifier(), "urn:agent:42");
    }

    #[test]
    fn malformed_forms_rejected() {
        for bad in [
            "",
            "did:sage:ethereum:",
            "did:sage:mars:abc",
            "did:web:ethereum:abc",
            "sage:ethereum:abc",
        ] {
            assert!(bad.parse::<Did>().is_err(), "expected rejection of {bad:?}");
        }
    }

    #[test]
    fn generated_dids_are_uuids() {
        let did = Did::generate(Network::Solana);
        assert!(uuid::Uuid::parse_str(did.identifier()).is_ok());
        assert!(did.to_string().starts_with("did:sage:solana:"));
    }
}
