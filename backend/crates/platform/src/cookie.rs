//! Cookie Management Infrastructure
//!
//! `Set-Cookie` building and `Cookie` header parsing.

use axum::http::{HeaderMap, HeaderValue, header, header::InvalidHeaderValue};
use chrono::{DateTime, Utc};

/// `Expires` value used when deleting a cookie
const EPOCH_HTTP_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// SameSite policy for cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Cookie attributes shared by issuing and clearing
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub path: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "session".to_string(),
            domain: None,
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
        }
    }
}

impl CookieConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_domain(mut self, domain: Option<String>) -> Self {
        self.domain = domain.filter(|d| !d.is_empty());
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Build a `Set-Cookie` value that lives until `expires_at`
    ///
    /// Both `Expires` and `Max-Age` are emitted; `Max-Age` is measured from `now`.
    pub fn build_set_cookie(
        &self,
        value: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> String {
        let max_age = (expires_at - now).num_seconds().max(0);
        let mut cookie = format!("{}={}", self.name, value);
        self.push_attributes(&mut cookie);
        cookie.push_str(&format!("; Max-Age={}", max_age));
        cookie.push_str(&format!("; Expires={}", http_date(expires_at)));
        cookie
    }

    /// Build a `Set-Cookie` value that makes the browser drop the cookie
    ///
    /// Attributes must match the issuing cookie or the browser keeps the old one.
    pub fn build_delete_cookie(&self) -> String {
        let mut cookie = format!("{}=", self.name);
        self.push_attributes(&mut cookie);
        cookie.push_str("; Max-Age=0");
        cookie.push_str(&format!("; Expires={}", EPOCH_HTTP_DATE));
        cookie
    }

    fn push_attributes(&self, cookie: &mut String) {
        cookie.push_str(&format!("; Path={}", self.path));
        if let Some(domain) = &self.domain {
            cookie.push_str(&format!("; Domain={}", domain));
        }
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site.as_str()));
    }
}

/// RFC 7231 IMF-fixdate
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Extract a cookie value from headers
///
/// All `Cookie` headers are searched; HTTP/2 clients may split them.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;

            if key == name {
                Some(value.to_string())
            } else {
                None
            }
        })
}

/// Names of every cookie the request carries, in order, without duplicates
pub fn cookie_names(headers: &HeaderMap) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let pairs = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'));

    for cookie in pairs {
        if let Some((key, _)) = cookie.trim().split_once('=') {
            if !key.is_empty() && !names.iter().any(|name| name == key) {
                names.push(key.to_string());
            }
        }
    }
    names
}

/// Turn a built `Set-Cookie` string into a header value
pub fn set_cookie_header(cookie: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(cookie)
}
