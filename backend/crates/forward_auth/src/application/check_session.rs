//! Check Session Use Case
//!
//! Classifies the session cookie, then decides allow or deny.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::cookie_codec::{CookieCodec, CookieError};
use crate::domain::domain_matcher::DomainMatcher;
use crate::domain::payload::SessionPayload;

/// What the request's session cookie turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    NoCookie,
    Invalid(CookieError),
    Valid(SessionPayload),
}

/// Why a verified session was still refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    InvalidCookie(CookieError),
    NotAuthorized(String),
}

/// Outcome of checking a present session cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthzDecision {
    Allow(String),
    Deny(DenyReason),
}

/// Check session use case
pub struct CheckSessionUseCase {
    codec: Arc<CookieCodec>,
    matcher: Arc<DomainMatcher>,
}

impl CheckSessionUseCase {
    pub fn new(codec: Arc<CookieCodec>, matcher: Arc<DomainMatcher>) -> Self {
        Self { codec, matcher }
    }

    /// Classify the raw cookie value, if any
    pub fn classify(&self, cookie_value: Option<&str>, now: DateTime<Utc>) -> SessionState {
        match cookie_value {
            None => SessionState::NoCookie,
            Some(value) => match self.codec.verify_at::<SessionPayload>(value, now) {
                Ok(payload) => SessionState::Valid(payload),
                Err(e) => SessionState::Invalid(e),
            },
        }
    }

    /// Decide for a cookie that was present
    ///
    /// `None` for [`SessionState::NoCookie`]: that case starts a login instead.
    pub fn decide(&self, state: SessionState) -> Option<AuthzDecision> {
        match state {
            SessionState::NoCookie => None,
            SessionState::Invalid(e) => Some(AuthzDecision::Deny(DenyReason::InvalidCookie(e))),
            SessionState::Valid(session) => {
                if self.matcher.is_authorized(&session.email) {
                    Some(AuthzDecision::Allow(session.email))
                } else {
                    Some(AuthzDecision::Deny(DenyReason::NotAuthorized(session.email)))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use platform::crypto::Secret;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn use_case(allowed_emails: &[&str]) -> CheckSessionUseCase {
        let codec = Arc::new(CookieCodec::new(Secret::new(b"session-secret".to_vec())));
        let matcher = DomainMatcher::new(
            Vec::new(),
            Vec::new(),
            allowed_emails.iter().map(|e| e.to_string()),
        );
        CheckSessionUseCase::new(codec, Arc::new(matcher))
    }

    fn session_cookie(uc: &CheckSessionUseCase, email: &str, expires: DateTime<Utc>) -> String {
        uc.codec.sign(&SessionPayload::new(email, expires))
    }

    #[test]
    fn test_no_cookie() {
        let uc = use_case(&[]);
        let state = uc.classify(None, now());
        assert_eq!(state, SessionState::NoCookie);
        assert_eq!(uc.decide(state), None);
    }

    #[test]
    fn test_valid_and_authorized() {
        let uc = use_case(&["a@x.com"]);
        let cookie = session_cookie(&uc, "a@x.com", now() + Duration::hours(1));
        let state = uc.classify(Some(&cookie), now());
        assert!(matches!(state, SessionState::Valid(ref s) if s.email == "a@x.com"));
        assert_eq!(uc.decide(state), Some(AuthzDecision::Allow("a@x.com".to_string())));
    }

    #[test]
    fn test_valid_but_not_authorized() {
        let uc = use_case(&["a@x.com"]);
        let cookie = session_cookie(&uc, "b@x.com", now() + Duration::hours(1));
        let decision = uc.decide(uc.classify(Some(&cookie), now()));
        assert_eq!(
            decision,
            Some(AuthzDecision::Deny(DenyReason::NotAuthorized("b@x.com".to_string())))
        );
    }

    #[test]
    fn test_empty_email_is_denied() {
        let uc = use_case(&[]);
        let cookie = session_cookie(&uc, "", now() + Duration::hours(1));
        let state = uc.classify(Some(&cookie), now());
        assert!(matches!(state, SessionState::Valid(_)));
        assert!(matches!(
            uc.decide(state),
            Some(AuthzDecision::Deny(DenyReason::NotAuthorized(_)))
        ));
    }

    #[test]
    fn test_expired_cookie() {
        let uc = use_case(&[]);
        let cookie = session_cookie(&uc, "a@x.com", now() - Duration::seconds(1));
        let state = uc.classify(Some(&cookie), now());
        assert_eq!(state, SessionState::Invalid(CookieError::Expired));
        assert_eq!(
            uc.decide(state),
            Some(AuthzDecision::Deny(DenyReason::InvalidCookie(CookieError::Expired)))
        );
    }

    #[test]
    fn test_garbage_cookie() {
        let uc = use_case(&[]);
        assert_eq!(
            uc.classify(Some("garbage"), now()),
            SessionState::Invalid(CookieError::Malformed)
        );
    }
}
