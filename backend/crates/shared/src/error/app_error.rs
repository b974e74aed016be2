//! Application Error - Unified error type for the application
//!
//! Defines the [`AppError`] struct.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use super::kind::ErrorKind;

/// Unified application error.
///
/// `message` is internal detail for logs. What reaches the client is only
/// [`ErrorKind::as_str`], so an auth boundary never tells a caller which
/// check rejected it.
///
/// ## Examples
/// ```rust
/// use kernel::error::{app_error::AppError, kind::ErrorKind};
///
/// let err = AppError::new(ErrorKind::Unauthorized, "csrf state mismatch");
/// assert_eq!(err.status_code(), 401);
/// assert_eq!(err.public_message(), "Not authorized");
/// ```
pub struct AppError {
    kind: ErrorKind,
    message: Cow<'static, str>,
}

impl AppError {
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    /// Internal detail
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// What the client is allowed to see
    #[inline]
    pub fn public_message(&self) -> &'static str {
        self.kind.as_str()
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_error() {
        let err = AppError::new(ErrorKind::Unauthorized, "session cookie expired");
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.message(), "session cookie expired");
    }

    #[test]
    fn test_public_message_hides_detail() {
        let err = AppError::new(ErrorKind::Unauthorized, "nonce mismatch for state abc");
        assert_eq!(err.public_message(), "Not authorized");
        assert!(!err.public_message().contains("nonce"));
    }

    #[test]
    fn test_display() {
        let err = AppError::new(ErrorKind::Unauthorized, "missing cookie");
        assert_eq!(err.to_string(), "[Not authorized] missing cookie");
    }

    #[test]
    fn test_debug_shows_kind_and_detail() {
        let err = AppError::new(ErrorKind::ServiceUnavailable, "token endpoint timed out");
        let debug = format!("{err:?}");
        assert!(debug.contains("ServiceUnavailable"));
        assert!(debug.contains("token endpoint timed out"));
    }
}
