//! Role/secret access gate and in-memory session registry.
//!
//! Two fixed roles share one secret each. A successful login mints a bearer
//! token held in process memory until logout or shutdown. There is no
//! lockout, rate limiting, or rotation: this gate protects a single
//! household's journal, not a multi-tenant service.

use std::fmt;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Author,
    Reader,
}

impl Role {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "author" => Some(Role::Author),
            "reader" => Some(Role::Reader),
            _ => None,
        }
    }
}

/// Permission level granted after authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Author,
    Reader,
}

impl Capability {
    pub fn can_author(&self) -> bool {
        matches!(self, Capability::Author)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    UnknownRole(String),
    InvalidSecret,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::UnknownRole(role) => write!(f, "unknown role '{}'", role),
            AuthError::InvalidSecret => write!(f, "invalid secret"),
        }
    }
}

impl std::error::Error for AuthError {}

pub struct SessionGate {
    author_secret: String,
    reader_secret: String,
    sessions: DashMap<String, Capability>,
}

impl SessionGate {
    pub fn new(author_secret: String, reader_secret: String) -> Self {
        Self {
            author_secret,
            reader_secret,
            sessions: DashMap::new(),
        }
    }

    /// Maps a role string and submitted secret to a capability. Unrecognized
    /// roles never authenticate, whatever the secret.
    pub fn authenticate(&self, role: &str, secret: &str) -> Result<Capability, AuthError> {
        let role = Role::from_str(role).ok_or_else(|| AuthError::UnknownRole(role.to_string()))?;
        let (expected, capability) = match role {
            Role::Author => (&self.author_secret, Capability::Author),
            Role::Reader => (&self.reader_secret, Capability::Reader),
        };
        if secret != expected {
            return Err(AuthError::InvalidSecret);
        }
        Ok(capability)
    }

    /// Authenticates and mints a session token for the client to hold.
    pub fn login(&self, role: &str, secret: &str) -> Result<(String, Capability), AuthError> {
        let capability = self.authenticate(role, secret)?;
        let token = Self::generate_session_token();
        self.sessions.insert(token.clone(), capability);
        Ok((token, capability))
    }

    pub fn capability(&self, token: &str) -> Option<Capability> {
        self.sessions.get(token).map(|entry| *entry.value())
    }

    /// Clears the session unconditionally; an unknown token is not an error.
    pub fn logout(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    fn generate_session_token() -> String {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        (0..32)
            .map(|_| format!("{:x}", rng.r#gen::<u8>() % 16))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> SessionGate {
        SessionGate::new("admin123".to_string(), "love123".to_string())
    }

    #[test]
    fn author_secret_grants_author_capability() {
        assert_eq!(gate().authenticate("author", "admin123"), Ok(Capability::Author));
    }

    #[test]
    fn reader_secret_grants_reader_capability() {
        assert_eq!(gate().authenticate("reader", "love123"), Ok(Capability::Reader));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        assert_eq!(
            gate().authenticate("author", "love123"),
            Err(AuthError::InvalidSecret)
        );
        assert_eq!(
            gate().authenticate("reader", ""),
            Err(AuthError::InvalidSecret)
        );
    }

    #[test]
    fn unknown_role_never_authenticates() {
        let gate = gate();
        for role in ["admin", "viewer", "", "AUTHORx"] {
            assert!(matches!(
                gate.authenticate(role, "admin123"),
                Err(AuthError::UnknownRole(_))
            ));
        }
    }

    #[test]
    fn login_mints_a_token_that_validates_until_logout() {
        let gate = gate();
        let (token, capability) = gate.login("author", "admin123").unwrap();
        assert_eq!(capability, Capability::Author);
        assert_eq!(token.len(), 32);
        assert_eq!(gate.capability(&token), Some(Capability::Author));

        assert!(gate.logout(&token));
        assert_eq!(gate.capability(&token), None);
        // Logging out twice is harmless.
        assert!(!gate.logout(&token));
    }

    #[test]
    fn role_strings_are_case_insensitive() {
        assert_eq!(gate().authenticate("Author", "admin123"), Ok(Capability::Author));
    }
}
