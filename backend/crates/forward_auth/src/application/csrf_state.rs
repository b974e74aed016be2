//! CSRF State Manager
//!
//! Binds a login redirect to the browser that started it, and remembers where
//! that browser was going.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use platform::crypto::{constant_time_eq, random_hex};
use thiserror::Error;

use crate::domain::cookie_codec::{CookieCodec, CookieError};
use crate::domain::payload::CsrfPayload;

/// Nonce entropy in bytes (rendered as twice as many hex characters)
pub const NONCE_BYTES: usize = 16;

/// Characters of the nonce appended to the CSRF cookie name
const COOKIE_SUFFIX_LEN: usize = 8;

/// How long a login round-trip may take, in seconds
pub const CSRF_COOKIE_TTL_SECS: i64 = 3600;

/// Why a callback's login state was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CsrfError {
    #[error("csrf cookie missing")]
    Missing,

    #[error("csrf state does not match cookie")]
    Mismatch,

    #[error("csrf cookie rejected: {0}")]
    InvalidCookie(CookieError),
}

/// Output of [`CsrfStateManager::begin_login`]
#[derive(Debug, Clone)]
pub struct LoginStart {
    /// Sent to the provider as the OAuth2 `state`
    pub nonce: String,
    pub cookie_name: String,
    pub cookie_value: String,
    pub expires_at: DateTime<Utc>,
}

/// CSRF state manager
pub struct CsrfStateManager {
    codec: Arc<CookieCodec>,
    cookie_prefix: String,
}

impl CsrfStateManager {
    pub fn new(codec: Arc<CookieCodec>, cookie_prefix: impl Into<String>) -> Self {
        Self {
            codec,
            cookie_prefix: cookie_prefix.into(),
        }
    }

    /// Start a login for `original_url` at `now`
    ///
    /// The signed state is good for [`CSRF_COOKIE_TTL_SECS`].
    pub fn begin_login(&self, original_url: &str, now: DateTime<Utc>) -> LoginStart {
        let nonce = random_hex(NONCE_BYTES);
        let expires_at = now + Duration::seconds(CSRF_COOKIE_TTL_SECS);
        let cookie_value = self
            .codec
            .sign(&CsrfPayload::new(nonce.clone(), original_url, expires_at));

        LoginStart {
            cookie_name: self.cookie_name_for_nonce(&nonce),
            nonce,
            cookie_value,
            expires_at,
        }
    }

    /// Name of the CSRF cookie a callback with `state` should carry
    ///
    /// `None` when the state is too short or not plain ASCII to have come from
    /// [`CsrfStateManager::begin_login`].
    pub fn cookie_name_for_state(&self, state: &str) -> Option<String> {
        if state.len() < COOKIE_SUFFIX_LEN || !state.is_char_boundary(COOKIE_SUFFIX_LEN) {
            return None;
        }
        let suffix = &state[..COOKIE_SUFFIX_LEN];
        if !suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(self.cookie_name_for_nonce(state))
    }

    /// Whether `name` has the shape of a CSRF cookie this manager issues
    pub fn owns_cookie(&self, name: &str) -> bool {
        name.strip_prefix(self.cookie_prefix.as_str())
            .and_then(|rest| rest.strip_prefix('_'))
            .is_some_and(|suffix| {
                suffix.len() == COOKIE_SUFFIX_LEN
                    && suffix.chars().all(|c| c.is_ascii_alphanumeric())
            })
    }

    /// Check the callback's `state` against the CSRF cookie as of `now`
    ///
    /// Returns the redirect target stored at login start. The nonce must match
    /// byte for byte.
    pub fn complete_login(
        &self,
        cookie_value: Option<&str>,
        state: &str,
        now: DateTime<Utc>,
    ) -> Result<String, CsrfError> {
        let cookie_value = cookie_value
            .filter(|v| !v.is_empty())
            .ok_or(CsrfError::Missing)?;

        let payload = self
            .codec
            .verify_at::<CsrfPayload>(cookie_value, now)
            .map_err(CsrfError::InvalidCookie)?;

        if !constant_time_eq(payload.nonce.as_bytes(), state.as_bytes()) {
            return Err(CsrfError::Mismatch);
        }

        Ok(payload.redirect)
    }

    fn cookie_name_for_nonce(&self, nonce: &str) -> String {
        format!("{}_{}", self.cookie_prefix, &nonce[..COOKIE_SUFFIX_LEN])
    }
}
