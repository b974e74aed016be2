//! Domain Matcher
//!
//! Cookie-domain selection for a request host, and the email allow-list policy.

use std::collections::HashSet;

/// A configured cookie domain, normalized (lower-case, no leading or trailing dot)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CookieDomain(String);

impl CookieDomain {
    /// Normalize a configured domain; `None` when nothing is left
    pub fn new(raw: &str) -> Option<Self> {
        let domain = raw.trim().trim_matches('.').to_ascii_lowercase();
        if domain.is_empty() {
            None
        } else {
            Some(Self(domain))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Label-wise suffix match: `example.com` covers `example.com` and
    /// `app.example.com`, never `notexample.com`.
    pub fn matches(&self, host: &str) -> bool {
        let host = normalize_host(host);
        match host.strip_suffix(self.0.as_str()) {
            Some("") => true,
            Some(prefix) => prefix.ends_with('.'),
            None => false,
        }
    }
}

impl std::fmt::Display for CookieDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host lower-cased, port and trailing dot removed
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let without_port = if let Some(rest) = host.strip_prefix('[') {
        // bracketed IPv6 literal
        rest.split_once(']').map(|(addr, _)| addr).unwrap_or(rest)
    } else {
        match host.rsplit_once(':') {
            Some((name, port))
                if !name.contains(':') && port.chars().all(|c| c.is_ascii_digit()) =>
            {
                name
            }
            _ => host,
        }
    };
    without_port.trim_end_matches('.').to_ascii_lowercase()
}

/// Cookie-domain selection and identity authorization
///
/// Empty allow-lists mean "no restriction of that kind".
#[derive(Debug, Clone, Default)]
pub struct DomainMatcher {
    cookie_domains: Vec<CookieDomain>,
    allowed_domains: HashSet<String>,
    allowed_emails: HashSet<String>,
}

impl DomainMatcher {
    pub fn new(
        cookie_domains: Vec<CookieDomain>,
        allowed_domains: impl IntoIterator<Item = String>,
        allowed_emails: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            cookie_domains,
            allowed_domains: allowed_domains.into_iter().collect(),
            allowed_emails: allowed_emails.into_iter().collect(),
        }
    }

    /// The most specific configured domain covering `request_host`
    ///
    /// `None` means the cookie is scoped to the exact host.
    pub fn select_cookie_domain(&self, request_host: &str) -> Option<&CookieDomain> {
        self.cookie_domains
            .iter()
            .filter(|domain| domain.matches(request_host))
            .max_by_key(|domain| domain.as_str().len())
    }

    /// Whether a cookie set while serving `auth_host` would reach `request_host`
    pub fn shares_cookie_domain(&self, request_host: &str, auth_host: &str) -> bool {
        match (
            self.select_cookie_domain(request_host),
            self.select_cookie_domain(auth_host),
        ) {
            (Some(request_domain), Some(auth_domain)) => request_domain == auth_domain,
            _ => false,
        }
    }

    /// Email allow-list check
    ///
    /// Both configured lists must accept the email; an empty list accepts
    /// everything. Comparison is exact. An empty email is never authorized.
    pub fn is_authorized(&self, email: &str) -> bool {
        if email.is_empty() {
            return false;
        }

        let email_allowed = self.allowed_emails.is_empty() || self.allowed_emails.contains(email);

        let domain_allowed = self.allowed_domains.is_empty()
            || email
                .rsplit_once('@')
                .is_some_and(|(_, domain)| self.allowed_domains.contains(domain));

        email_allowed && domain_allowed
    }
}
