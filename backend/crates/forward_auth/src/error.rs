//! Forward-Auth Error Types
//!
//! This module provides forward-auth error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::client::ForwardedUriError;
use thiserror::Error;

use crate::application::csrf_state::CsrfError;
use crate::domain::cookie_codec::CookieError;
use crate::domain::provider::ProviderError;

/// Forward-auth result type alias
pub type ForwardAuthResult<T> = Result<T, ForwardAuthError>;

/// Forward-auth error variants
///
/// Every variant renders to the client as a bare status with a generic phrase.
#[derive(Debug, Error)]
pub enum ForwardAuthError {
    /// The proxy did not describe the original request usably
    #[error("Malformed forwarded request: {0}")]
    MalformedRequest(#[from] ForwardedUriError),

    /// Session cookie rejected
    #[error("Session cookie rejected: {0}")]
    Cookie(#[from] CookieError),

    /// Login state rejected on callback
    #[error("CSRF check failed: {0}")]
    Csrf(#[from] CsrfError),

    /// Authorization code could not be exchanged
    #[error("Code exchange failed: {0}")]
    Exchange(String),

    /// User identity could not be fetched
    #[error("User info fetch failed: {0}")]
    UserFetch(String),

    /// Authenticated, but not on the allow-lists
    #[error("Email not authorized: {0}")]
    Unauthorized(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ForwardAuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ForwardAuthError::Cookie(_)
            | ForwardAuthError::Csrf(_)
            | ForwardAuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ForwardAuthError::MalformedRequest(_)
            | ForwardAuthError::Exchange(_)
            | ForwardAuthError::UserFetch(_) => StatusCode::SERVICE_UNAVAILABLE,
            ForwardAuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForwardAuthError::Cookie(_)
            | ForwardAuthError::Csrf(_)
            | ForwardAuthError::Unauthorized(_) => ErrorKind::Unauthorized,
            ForwardAuthError::MalformedRequest(_)
            | ForwardAuthError::Exchange(_)
            | ForwardAuthError::UserFetch(_) => ErrorKind::ServiceUnavailable,
            ForwardAuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            ForwardAuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Forward-auth internal error");
            }
            ForwardAuthError::MalformedRequest(e) => {
                tracing::warn!(error = %e, "Unusable forwarded request headers");
            }
            ForwardAuthError::Csrf(CsrfError::Mismatch) => {
                tracing::warn!("CSRF state mismatch on callback");
            }
            ForwardAuthError::Exchange(msg) => {
                tracing::warn!(error = %msg, "Authorization code exchange failed");
            }
            ForwardAuthError::UserFetch(msg) => {
                tracing::warn!(error = %msg, "User info fetch failed");
            }
            ForwardAuthError::Unauthorized(email) => {
                tracing::info!(email = %email, "Authenticated user not on allow-lists");
            }
            _ => {
                tracing::debug!(error = %self, "Forward-auth request rejected");
            }
        }
    }
}

impl IntoResponse for ForwardAuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<ForwardAuthError> for AppError {
    fn from(err: ForwardAuthError) -> Self {
        err.to_app_error()
    }
}

impl From<ProviderError> for ForwardAuthError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Exchange(msg) => ForwardAuthError::Exchange(msg),
            ProviderError::UserFetch(msg) => ForwardAuthError::UserFetch(msg),
        }
    }
}
