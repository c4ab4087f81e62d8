//! Connection admission
//!
//! Every namespace runs a [`ConnectGate`] before a socket reaches its
//! connection handler. The standard gate is [`SessionGate`], which resolves
//! the presented token against the session authority.

use std::sync::Arc;

use axum::http::HeaderMap;
use pd_core::traits::SessionValidator;
use pd_core::{AuthError, Session, SESSION_HEADER};

/// What the client presented when opening a realtime connection
#[derive(Debug, Clone, Default)]
pub struct Handshake {
    /// Token from the handshake authentication payload
    pub auth_token: Option<String>,
    /// Request headers
    pub headers: HeaderMap,
}

impl Handshake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Add a header; values that are not valid header text are ignored
    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.insert(name, value);
        }
        self
    }

    /// Resolve the presented token: a non-blank authentication payload wins
    /// over the named header
    pub fn token(&self, header: &str) -> Option<&str> {
        let present = |token: &&str| !token.trim().is_empty();
        self.auth_token.as_deref().filter(present).or_else(|| {
            self.headers
                .get(header)
                .and_then(|value| value.to_str().ok())
                .filter(present)
        })
    }
}

/// Admission check run before a connection is accepted
pub trait ConnectGate: Send + Sync {
    fn check(&self, handshake: &Handshake) -> Result<Session, AuthError>;
}

/// Gate that requires a live session token
pub struct SessionGate {
    validator: Arc<dyn SessionValidator>,
    header: &'static str,
}

impl SessionGate {
    pub fn new(validator: Arc<dyn SessionValidator>) -> Self {
        Self {
            validator,
            header: SESSION_HEADER,
        }
    }

    /// Read the fallback token from a different header
    pub fn with_header(mut self, header: &'static str) -> Self {
        self.header = header;
        self
    }
}

impl ConnectGate for SessionGate {
    fn check(&self, handshake: &Handshake) -> Result<Session, AuthError> {
        let token = handshake.token(self.header);
        self.validator.validate(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::SessionAuthority;

    fn gate_with_session() -> (SessionGate, Session) {
        let authority = Arc::new(SessionAuthority::new());
        let session = authority.issue("local", ["admin"]);
        (SessionGate::new(authority), session)
    }

    #[test]
    fn test_missing_token() {
        let (gate, _) = gate_with_session();
        assert_eq!(gate.check(&Handshake::new()).unwrap_err(), AuthError::Missing);
    }

    #[test]
    fn test_auth_payload_token() {
        let (gate, session) = gate_with_session();
        let handshake = Handshake::new().with_auth_token(session.token.clone());
        let admitted = gate.check(&handshake).unwrap();
        assert_eq!(admitted.token, session.token);
        assert_eq!(admitted.user_id, "local");
    }

    #[test]
    fn test_header_token() {
        let (gate, session) = gate_with_session();
        let handshake = Handshake::new().with_header(SESSION_HEADER, &session.token);
        assert!(gate.check(&handshake).is_ok());
    }

    #[test]
    fn test_payload_takes_precedence_over_header() {
        let (gate, session) = gate_with_session();
        let handshake = Handshake::new()
            .with_auth_token("bogus")
            .with_header(SESSION_HEADER, &session.token);
        assert_eq!(gate.check(&handshake).unwrap_err(), AuthError::Invalid);
    }

    #[test]
    fn test_blank_payload_falls_back_to_header() {
        let (gate, session) = gate_with_session();
        for blank in ["", "   "] {
            let handshake = Handshake::new()
                .with_auth_token(blank)
                .with_header(SESSION_HEADER, &session.token);
            assert_eq!(handshake.token(SESSION_HEADER), Some(session.token.as_str()));
            assert!(gate.check(&handshake).is_ok());
        }

        let blank_only = Handshake::new().with_auth_token("");
        assert_eq!(gate.check(&blank_only).unwrap_err(), AuthError::Missing);
    }

    #[test]
    fn test_custom_header() {
        let (gate, session) = gate_with_session();
        let gate = gate.with_header("x-desk-token");
        let handshake = Handshake::new().with_header("x-desk-token", &session.token);
        assert!(gate.check(&handshake).is_ok());
    }
}
