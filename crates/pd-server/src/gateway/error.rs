//! Connection rejection reasons

use pd_core::AuthError;
use pd_protocol::Frame;
use thiserror::Error;

/// WebSocket close code sent after an authentication rejection
pub const CLOSE_UNAUTHORIZED: u16 = 4401;

/// WebSocket close code sent when the namespace cannot take connections
pub const CLOSE_UNKNOWN_NAMESPACE: u16 = 4404;

/// Why a connection attempt was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("Unknown namespace: {0}")]
    UnknownNamespace(String),

    #[error("Namespace {0} has no connection handler")]
    Unavailable(String),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),
}

impl ConnectError {
    /// Machine-readable reason carried in the `connect_error` frame
    pub fn reason(&self) -> &'static str {
        match self {
            ConnectError::UnknownNamespace(_) => "UNKNOWN_NAMESPACE",
            ConnectError::Unavailable(_) => "UNAVAILABLE",
            ConnectError::Auth(err) => err.code(),
        }
    }

    pub fn close_code(&self) -> u16 {
        match self {
            ConnectError::Auth(_) => CLOSE_UNAUTHORIZED,
            ConnectError::UnknownNamespace(_) | ConnectError::Unavailable(_) => {
                CLOSE_UNKNOWN_NAMESPACE
            }
        }
    }

    /// The frame delivered to the client before the socket is closed
    pub fn to_frame(&self) -> Frame {
        Frame::connect_error(self.reason(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_protocol::CONNECT_ERROR_EVENT;

    #[test]
    fn test_auth_rejections_carry_auth_code() {
        let err = ConnectError::from(AuthError::Expired);
        assert_eq!(err.reason(), "EXPIRED");
        assert_eq!(err.close_code(), CLOSE_UNAUTHORIZED);

        let frame = err.to_frame();
        assert!(frame.is(CONNECT_ERROR_EVENT));
        assert_eq!(frame.data["reason"], "EXPIRED");
    }

    #[test]
    fn test_unknown_namespace() {
        let err = ConnectError::UnknownNamespace("/nope".into());
        assert_eq!(err.reason(), "UNKNOWN_NAMESPACE");
        assert_eq!(err.close_code(), CLOSE_UNKNOWN_NAMESPACE);
        assert!(err.to_string().contains("/nope"));
    }
}
