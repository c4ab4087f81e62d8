//! Session validation capability

use crate::error::AuthError;
use crate::session::Session;

/// Resolves a presented token to a live session
pub trait SessionValidator: Send + Sync {
    /// Validate a token; `None` or blank means no token was presented
    fn validate(&self, token: Option<&str>) -> Result<Session, AuthError>;
}
