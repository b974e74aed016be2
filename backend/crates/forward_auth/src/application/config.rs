//! Application Configuration
//!
//! Immutable settings for the decision engine, built once at startup and
//! shared through `Arc`.

use std::time::Duration;

use platform::crypto::Secret;
use thiserror::Error;
use url::Url;

use crate::domain::domain_matcher::{CookieDomain, DomainMatcher};

/// Longest session lifetime accepted
pub const MAX_LIFETIME: Duration = Duration::from_secs(365 * 24 * 3600);

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Rejected configuration, with every problem found
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// OAuth2 client settings
#[derive(Clone)]
pub struct ProviderSettings {
    pub client_id: String,
    pub client_secret: Secret,
    pub scope: String,
    pub prompt: Option<String>,
    pub login_url: Url,
    pub token_url: Url,
    pub user_url: Url,
    /// Bound on each outbound call (token exchange, user info)
    pub timeout: Duration,
}

impl ProviderSettings {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: Secret,
        login_url: Url,
        token_url: Url,
        user_url: Url,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            scope: String::new(),
            prompt: None,
            login_url,
            token_url,
            user_url,
            timeout: Duration::from_secs(10),
        }
    }

    fn problems(&self, problems: &mut Vec<String>) {
        if self.client_id.trim().is_empty() {
            problems.push("client id is required".to_string());
        }
        if self.client_secret.is_empty() {
            problems.push("client secret is required".to_string());
        }
        for (name, url) in [
            ("login url", &self.login_url),
            ("token url", &self.token_url),
            ("user url", &self.user_url),
        ] {
            if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
                problems.push(format!("{name} must be an absolute http(s) URL"));
            }
        }
        if self.timeout.is_zero() {
            problems.push("provider timeout must be greater than zero".to_string());
        }
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret)
            .field("scope", &self.scope)
            .field("prompt", &self.prompt)
            .field("login_url", &self.login_url.as_str())
            .field("token_url", &self.token_url.as_str())
            .field("user_url", &self.user_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Forward-auth configuration
#[derive(Debug, Clone)]
pub struct ForwardAuthConfig {
    /// HMAC key for session and CSRF cookies
    pub secret: Secret,
    /// Session cookie lifetime (12 hours by default)
    pub lifetime: Duration,
    /// Path the provider redirects back to
    pub callback_path: String,
    /// Central login host shared by several protected services
    pub auth_host: Option<String>,
    pub cookie_name: String,
    /// Prefix of the per-login CSRF cookie name
    pub csrf_cookie_name: String,
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
    pub cookie_domains: Vec<CookieDomain>,
    /// Allowed email domains; empty means any
    pub allowed_domains: Vec<String>,
    /// Allowed emails; empty means any
    pub allowed_emails: Vec<String>,
    pub provider: ProviderSettings,
}

impl ForwardAuthConfig {
    pub fn new(secret: Secret, provider: ProviderSettings) -> Self {
        Self {
            secret,
            lifetime: Duration::from_secs(12 * 3600),
            callback_path: "/_oauth".to_string(),
            auth_host: None,
            cookie_name: "_forward_auth".to_string(),
            csrf_cookie_name: "_forward_auth_csrf".to_string(),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            cookie_domains: Vec::new(),
            allowed_domains: Vec::new(),
            allowed_emails: Vec::new(),
            provider,
        }
    }

    /// Check every setting, reporting all problems at once
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.secret.is_empty() {
            problems.push("secret is required".to_string());
        }
        if self.lifetime.is_zero() {
            problems.push("lifetime must be greater than zero".to_string());
        }
        if self.lifetime > MAX_LIFETIME {
            problems.push("lifetime must not exceed 365 days".to_string());
        }
        if !self.callback_path.starts_with('/') {
            problems.push("callback path must start with '/'".to_string());
        }
        if self.cookie_name.trim().is_empty() {
            problems.push("cookie name is required".to_string());
        }
        if self.csrf_cookie_name.trim().is_empty() {
            problems.push("csrf cookie name is required".to_string());
        }
        if self.cookie_name == self.csrf_cookie_name {
            problems.push("cookie name and csrf cookie name must differ".to_string());
        }
        if self.auth_host.as_deref().is_some_and(|h| h.contains('/')) {
            problems.push("auth host must be a bare host name".to_string());
        }
        self.provider.problems(&mut problems);

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }

    /// Domain and identity policy derived from this config
    pub fn domain_matcher(&self) -> DomainMatcher {
        DomainMatcher::new(
            self.cookie_domains.clone(),
            self.allowed_domains.iter().cloned(),
            self.allowed_emails.iter().cloned(),
        )
    }

    /// Session lifetime, clamped to [`MAX_LIFETIME`]
    pub fn lifetime_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.lifetime.min(MAX_LIFETIME))
            .unwrap_or(chrono::Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> ProviderSettings {
        ProviderSettings::new(
            "client",
            Secret::new(b"client-secret".to_vec()),
            Url::parse("https://idp.test/authorize").unwrap(),
            Url::parse("https://idp.test/token").unwrap(),
            Url::parse("https://idp.test/userinfo").unwrap(),
        )
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = ForwardAuthConfig::new(Secret::new(b"s3cret".to_vec()), provider());
        assert_eq!(config.callback_path, "/_oauth");
        assert_eq!(config.lifetime, Duration::from_secs(43200));
        assert!(config.cookie_secure);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_collects_every_problem() {
        let mut provider = provider();
        provider.client_id = String::new();
        provider.client_secret = Secret::new(Vec::new());
        provider.user_url = Url::parse("ftp://idp.test/userinfo").unwrap();

        let mut config = ForwardAuthConfig::new(Secret::new(Vec::new()), provider);
        config.lifetime = Duration::ZERO;
        config.callback_path = "_oauth".to_string();

        let Err(ConfigError::Invalid(problems)) = config.validate() else {
            panic!("config should be rejected");
        };
        assert_eq!(problems.len(), 6);
        assert!(problems.iter().any(|p| p.contains("secret is required")));
        assert!(problems.iter().any(|p| p.contains("user url")));
    }

    #[test]
    fn test_lifetime_upper_bound() {
        let mut config = ForwardAuthConfig::new(Secret::new(b"s3cret".to_vec()), provider());

        config.lifetime = MAX_LIFETIME;
        assert!(config.validate().is_ok());

        for lifetime in [MAX_LIFETIME + Duration::from_secs(1), Duration::from_secs(u64::MAX)] {
            config.lifetime = lifetime;
            let Err(ConfigError::Invalid(problems)) = config.validate() else {
                panic!("lifetime {lifetime:?} should be rejected");
            };
            assert_eq!(problems, vec!["lifetime must not exceed 365 days".to_string()]);
        }

        assert_eq!(config.lifetime_chrono(), chrono::Duration::days(365));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ForwardAuthConfig::new(Secret::new(b"s3cret".to_vec()), provider());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(!rendered.contains("client-secret"));
        assert!(rendered.contains("REDACTED"));
    }
}
