//! Session credentials.

use serde::{Deserialize, Serialize};

/// Credentials for one authenticated session.
///
/// Owned by the backend wrapper for the lifetime of a session and replaced
/// wholesale on re-authentication, never mutated in place. The token is an
/// opaque bearer token acquired by an external collaborator (the host
/// application's auth flow).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Opaque bearer token.
    pub token: String,
    /// Provider-side login name, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    /// Display name, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Credentials {
    /// Creates credentials from a bearer token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            login: None,
            name: None,
        }
    }

    /// Sets the provider login name.
    #[must_use]
    pub fn with_login(mut self, login: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("login", &self.login)
            .field("name", &self.name)
            .finish()
    }
}
