//! Session Authority
//!
//! Issues, validates and invalidates bearer session tokens. State is purely
//! in memory: sessions do not survive a restart.
//!
//! # Lifecycle
//!
//! - `issue` creates a session with a fixed time-to-live
//! - `invalidate` (lock) removes it immediately
//! - expiry is lazy: the first `validate` at or after `expires_at` removes the
//!   session and reports `Expired`; afterwards the token is simply unknown
//!
//! An expired or invalidated session is absent, not flagged. No background
//! sweep is required.

use std::collections::BTreeSet;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, InvalidateError};
use crate::time::{add_duration, current_time_millis, remaining_secs};
use crate::token::generate_token;
use crate::traits::SessionValidator;

/// Default session lifetime (30 minutes)
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// A server-held record proving a client previously authenticated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Bearer token (unique among live sessions)
    pub token: String,
    /// Authenticated user
    pub user_id: String,
    /// Granted permissions
    pub permissions: BTreeSet<String>,
    /// Creation time (Unix ms)
    pub created_at: u64,
    /// Expiry time (Unix ms); the session is invalid at or after this instant
    pub expires_at: u64,
    /// Always false for a live session; locking removes it
    pub is_locked: bool,
}

impl Session {
    /// Whether the session is expired at `now`
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    /// Seconds of validity left at `now`
    pub fn remaining_secs_at(&self, now: u64) -> u64 {
        remaining_secs(self.expires_at, now)
    }

    /// Whether the session carries a permission
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// Result of a successful invalidation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockReceipt {
    /// When the session was removed (Unix ms)
    pub locked_at: u64,
}

/// Owns the live-session map
pub struct SessionAuthority {
    /// Live sessions indexed by token
    sessions: DashMap<String, Session>,
    /// Lifetime given to newly issued sessions
    ttl: Duration,
}

impl SessionAuthority {
    /// Create an authority with the default 30 minute TTL
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }

    /// Create an authority with a custom TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Session lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a new session
    pub fn issue<I, P>(&self, user_id: impl Into<String>, permissions: I) -> Session
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.issue_at(user_id, permissions, current_time_millis())
    }

    /// Issue a new session as of `now`
    pub fn issue_at<I, P>(&self, user_id: impl Into<String>, permissions: I, now: u64) -> Session
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let user_id = user_id.into();
        let permissions: BTreeSet<String> = permissions.into_iter().map(Into::into).collect();

        loop {
            let token = generate_token();
            if let Entry::Vacant(slot) = self.sessions.entry(token.clone()) {
                let session = Session {
                    token,
                    user_id,
                    permissions,
                    created_at: now,
                    expires_at: add_duration(now, self.ttl),
                    is_locked: false,
                };
                slot.insert(session.clone());
                tracing::debug!("Issued session for user {}", session.user_id);
                return session;
            }
        }
    }

    /// Validate a token
    pub fn validate(&self, token: Option<&str>) -> Result<Session, AuthError> {
        self.validate_at(token, current_time_millis())
    }

    /// Validate a token as of `now`
    pub fn validate_at(&self, token: Option<&str>, now: u64) -> Result<Session, AuthError> {
        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Err(AuthError::Missing),
        };

        if let Some((_, expired)) = self
            .sessions
            .remove_if(token, |_, session| session.is_expired_at(now))
        {
            tracing::debug!("Session for user {} expired", expired.user_id);
            return Err(AuthError::Expired);
        }

        match self.sessions.get(token) {
            Some(session) => Ok(session.clone()),
            None => Err(AuthError::Invalid),
        }
    }

    /// Invalidate (lock) a session
    pub fn invalidate(&self, token: &str) -> Result<LockReceipt, InvalidateError> {
        self.invalidate_at(token, current_time_millis())
    }

    /// Invalidate a session as of `now`.
    ///
    /// A session already past its expiry counts as absent.
    pub fn invalidate_at(&self, token: &str, now: u64) -> Result<LockReceipt, InvalidateError> {
        match self.sessions.remove(token) {
            Some((_, session)) if !session.is_expired_at(now) => {
                tracing::debug!("Locked session for user {}", session.user_id);
                Ok(LockReceipt { locked_at: now })
            }
            _ => Err(InvalidateError::NotFound),
        }
    }

    /// Number of sessions in the live map (including not-yet-noticed expiries)
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionValidator for SessionAuthority {
    fn validate(&self, token: Option<&str>) -> Result<Session, AuthError> {
        SessionAuthority::validate(self, token)
    }
}
