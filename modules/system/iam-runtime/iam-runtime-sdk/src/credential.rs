//! Secret-bearing values exchanged with the runtime.
//!
//! Both types wrap `SecretString` so `Debug` redacts the value and nothing
//! prints a raw credential by accident.

use secrecy::{ExposeSecret, SecretString};

/// Literal credential of a caller (such as a bearer token), passed to the
/// runtime with no transformation applied.
///
/// An empty credential is a valid value; it simply never authenticates.
#[derive(Debug, Clone)]
pub struct Credential(SecretString);

impl Credential {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(SecretString::from(raw.into()))
    }

    /// The credential of a caller that presented none.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(String::new())
    }

    /// Get the raw credential for forwarding to the runtime or a backend.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl From<&str> for Credential {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Credential {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

/// Opaque downstream access token minted by the identity contract.
///
/// Distinct from [`Credential`]: a token minted for an external system is
/// never accepted where a caller credential is expected.
#[derive(Debug, Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(SecretString::from(raw.into()))
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}
