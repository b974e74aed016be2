//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum that maps to HTTP status codes.

/// Error classification understood by the forwarding reverse proxy.
///
/// The proxy only interprets the status code, so the set is deliberately
/// narrow: a request is either allowed, denied, or could not be decided.
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::Unauthorized;
/// assert_eq!(kind.status_code(), 401);
/// assert_eq!(kind.as_str(), "Not authorized");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// 401 - not authenticated, or authenticated but not allowed
    Unauthorized,
    /// 500 - bug or broken invariant inside the service
    InternalServerError,
    /// 503 - upstream misconfiguration or identity provider failure
    ServiceUnavailable,
}

impl ErrorKind {
    /// HTTP status code for this kind
    #[inline]
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Unauthorized => 401,
            ErrorKind::InternalServerError => 500,
            ErrorKind::ServiceUnavailable => 503,
        }
    }

    /// Client-visible phrase
    ///
    /// This is the whole response body for errors; it never says which
    /// validation step failed.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "Not authorized",
            ErrorKind::InternalServerError => "Internal server error",
            ErrorKind::ServiceUnavailable => "Service unavailable",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
