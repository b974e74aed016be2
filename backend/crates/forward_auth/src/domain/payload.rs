//! Cookie Payloads
//!
//! The small structured values carried by signed cookies.

use chrono::{DateTime, Utc};

use crate::domain::cookie_codec::CookieError;

/// A value that can travel inside a signed cookie
///
/// Fields are plain strings; the codec handles encoding and signing.
pub trait CookiePayload: Sized {
    /// Mixed into the MAC so a token issued for one purpose never verifies as another
    const PURPOSE: &'static str;

    /// Number of fields produced by [`CookiePayload::to_fields`]
    const FIELD_COUNT: usize;

    fn to_fields(&self) -> Vec<String>;

    fn from_fields(fields: Vec<String>) -> Result<Self, CookieError>;

    /// Unix seconds after which the payload is no longer valid
    fn expires_at_secs(&self) -> i64;
}

/// Authenticated session: who, and until when
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPayload {
    pub email: String,
    pub expires_at_secs: i64,
}

impl SessionPayload {
    pub fn new(email: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            email: email.into(),
            expires_at_secs: expires_at.timestamp(),
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at_secs, 0)
    }
}

impl CookiePayload for SessionPayload {
    const PURPOSE: &'static str = "session";
    const FIELD_COUNT: usize = 2;

    fn to_fields(&self) -> Vec<String> {
        vec![self.email.clone(), self.expires_at_secs.to_string()]
    }

    fn from_fields(fields: Vec<String>) -> Result<Self, CookieError> {
        let [email, expires]: [String; 2] =
            fields.try_into().map_err(|_| CookieError::Malformed)?;
        let expires_at_secs = expires.parse().map_err(|_| CookieError::Malformed)?;
        Ok(Self {
            email,
            expires_at_secs,
        })
    }

    fn expires_at_secs(&self) -> i64 {
        self.expires_at_secs
    }
}

/// Login round-trip state: the nonce sent as OAuth2 `state`, where to go
/// afterwards, and how long the round-trip may take
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfPayload {
    pub nonce: String,
    pub redirect: String,
    pub expires_at_secs: i64,
}

impl CsrfPayload {
    pub fn new(
        nonce: impl Into<String>,
        redirect: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            nonce: nonce.into(),
            redirect: redirect.into(),
            expires_at_secs: expires_at.timestamp(),
        }
    }
}

impl CookiePayload for CsrfPayload {
    const PURPOSE: &'static str = "csrf";
    const FIELD_COUNT: usize = 3;

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.nonce.clone(),
            self.redirect.clone(),
            self.expires_at_secs.to_string(),
        ]
    }

    fn from_fields(fields: Vec<String>) -> Result<Self, CookieError> {
        let [nonce, redirect, expires]: [String; 3] =
            fields.try_into().map_err(|_| CookieError::Malformed)?;
        let expires_at_secs = expires.parse().map_err(|_| CookieError::Malformed)?;
        Ok(Self {
            nonce,
            redirect,
            expires_at_secs,
        })
    }

    fn expires_at_secs(&self) -> i64 {
        self.expires_at_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_session_fields() {
        let at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let payload = SessionPayload::new("a@x.com", at);
        assert_eq!(payload.to_fields(), vec!["a@x.com", "1893456000"]);
        assert_eq!(payload.expires_at(), Some(at));
    }

    #[test]
    fn test_session_rejects_non_numeric_expiry() {
        let fields = vec!["a@x.com".to_string(), "tomorrow".to_string()];
        assert_eq!(
            SessionPayload::from_fields(fields),
            Err(CookieError::Malformed)
        );
    }

    #[test]
    fn test_wrong_field_count() {
        assert_eq!(
            CsrfPayload::from_fields(vec!["nonce".to_string(), "https://a/".to_string()]),
            Err(CookieError::Malformed)
        );
    }

    #[test]
    fn test_csrf_fields_carry_expiry() {
        let at = Utc.with_ymd_and_hms(2030, 1, 1, 1, 0, 0).unwrap();
        let payload = CsrfPayload::new("nonce", "https://app.example.com/", at);
        assert_eq!(
            payload.to_fields(),
            vec!["nonce", "https://app.example.com/", "1893459600"]
        );
        assert_eq!(payload.expires_at_secs(), at.timestamp());
    }
}
