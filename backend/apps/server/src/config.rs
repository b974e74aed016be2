//! Environment Configuration
//!
//! Builds [`ServerSettings`] from environment variables (after `.env` has
//! been loaded). Variable names follow the original flag names upper-cased.

use std::net::SocketAddr;
use std::time::Duration;

use forward_auth::{ConfigError, CookieDomain, ForwardAuthConfig, ProviderSettings};
use platform::crypto::Secret;
use thiserror::Error;
use url::Url;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:4181";

/// Startup configuration failure
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything the process needs to start
#[derive(Debug)]
pub struct ServerSettings {
    pub listen_addr: SocketAddr,
    pub forward_auth: ForwardAuthConfig,
}

/// Read settings from the process environment
pub fn from_env() -> Result<ServerSettings, SettingsError> {
    load(|name| std::env::var(name).ok())
}

/// Read settings through `lookup`
pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<ServerSettings, SettingsError> {
    let env = Env(lookup);

    let secret = match env.get("SECRET") {
        Some(secret) => secret,
        None => {
            let legacy = env
                .get("COOKIE_SECRET")
                .ok_or(SettingsError::Missing("SECRET"))?;
            tracing::warn!("COOKIE_SECRET is deprecated, use SECRET");
            legacy
        }
    };

    let mut provider = ProviderSettings::new(
        env.required("CLIENT_ID")?,
        Secret::new(env.required("CLIENT_SECRET")?.into_bytes()),
        env.url("LOGIN_URL")?,
        env.url("TOKEN_URL")?,
        env.url("USER_URL")?,
    );
    provider.scope = env.get("SCOPE").unwrap_or_default();
    provider.prompt = env.get("PROMPT");
    if let Some(secs) = env.number("PROVIDER_TIMEOUT")? {
        provider.timeout = Duration::from_secs(secs);
    }

    let mut config = ForwardAuthConfig::new(Secret::new(secret.into_bytes()), provider);
    if let Some(secs) = env.number("LIFETIME")? {
        config.lifetime = Duration::from_secs(secs);
    }
    if let Some(path) = env.get("URL_PATH") {
        config.callback_path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
    }
    config.auth_host = env.get("AUTH_HOST");
    if let Some(name) = env.get("COOKIE_NAME") {
        config.cookie_name = name;
    }
    if let Some(name) = env.get("CSRF_COOKIE_NAME") {
        config.csrf_cookie_name = name;
    }
    if let Some(secure) = env.boolean("COOKIE_SECURE")? {
        config.cookie_secure = secure;
    }
    config.cookie_domains = env
        .list("COOKIE_DOMAINS")
        .iter()
        .filter_map(|d| CookieDomain::new(d))
        .collect();
    config.allowed_domains = env.list("DOMAIN");
    config.allowed_emails = env.list("WHITELIST");

    config.validate()?;

    let listen_addr = env
        .get("LISTEN_ADDR")
        .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
    let listen_addr: SocketAddr = listen_addr.parse().map_err(|e: std::net::AddrParseError| {
        SettingsError::Invalid {
            name: "LISTEN_ADDR",
            reason: e.to_string(),
        }
    })?;

    Ok(ServerSettings {
        listen_addr,
        forward_auth: config,
    })
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Trimmed value; unset and blank are the same
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, SettingsError> {
        self.get(name).ok_or(SettingsError::Missing(name))
    }

    fn url(&self, name: &'static str) -> Result<Url, SettingsError> {
        let raw = self.required(name)?;
        Url::parse(&raw).map_err(|e| SettingsError::Invalid {
            name,
            reason: e.to_string(),
        })
    }

    fn number(&self, name: &'static str) -> Result<Option<u64>, SettingsError> {
        self.get(name)
            .map(|raw| {
                raw.parse().map_err(|_| SettingsError::Invalid {
                    name,
                    reason: format!("expected a whole number of seconds, got {raw:?}"),
                })
            })
            .transpose()
    }

    fn boolean(&self, name: &'static str) -> Result<Option<bool>, SettingsError> {
        self.get(name)
            .map(|raw| match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(SettingsError::Invalid {
                    name,
                    reason: format!("expected a boolean, got {raw:?}"),
                }),
            })
            .transpose()
    }

    /// Comma-separated list, blanks dropped
    fn list(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_from(pairs: &[(&str, &str)]) -> Result<ServerSettings, SettingsError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        load(|name| vars.get(name).cloned())
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("SECRET", "s3cret"),
        ("CLIENT_ID", "client"),
        ("CLIENT_SECRET", "client-secret"),
        ("LOGIN_URL", "https://accounts.google.com/o/oauth2/auth"),
        ("TOKEN_URL", "https://www.googleapis.com/oauth2/v3/token"),
        ("USER_URL", "https://www.googleapis.com/oauth2/v2/userinfo"),
    ];

    fn with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        REQUIRED.iter().chain(extra).copied().collect()
    }

    #[test]
    fn test_defaults() {
        let settings = load_from(REQUIRED).unwrap();
        let config = &settings.forward_auth;

        assert_eq!(settings.listen_addr, "0.0.0.0:4181".parse().unwrap());
        assert_eq!(config.callback_path, "/_oauth");
        assert_eq!(config.lifetime, Duration::from_secs(43200));
        assert_eq!(config.cookie_name, "_forward_auth");
        assert_eq!(config.csrf_cookie_name, "_forward_auth_csrf");
        assert!(config.cookie_secure);
        assert!(config.auth_host.is_none());
        assert!(config.cookie_domains.is_empty());
        assert!(config.allowed_domains.is_empty());
        assert_eq!(config.provider.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides() {
        let settings = load_from(&with(&[
            ("URL_PATH", "oauth2"),
            ("LIFETIME", "600"),
            ("AUTH_HOST", "auth.example.com"),
            ("COOKIE_DOMAINS", ".example.com, example.org,"),
            ("COOKIE_SECURE", "no"),
            ("DOMAIN", "x.com,y.com"),
            ("WHITELIST", "a@z.com"),
            ("SCOPE", "openid email"),
            ("PROMPT", "select_account"),
            ("PROVIDER_TIMEOUT", "3"),
            ("LISTEN_ADDR", "127.0.0.1:9000"),
        ]))
        .unwrap();
        let config = &settings.forward_auth;

        assert_eq!(config.callback_path, "/oauth2");
        assert_eq!(config.lifetime, Duration::from_secs(600));
        assert_eq!(config.auth_host.as_deref(), Some("auth.example.com"));
        let domains: Vec<&str> = config.cookie_domains.iter().map(CookieDomain::as_str).collect();
        assert_eq!(domains, vec!["example.com", "example.org"]);
        assert!(!config.cookie_secure);
        assert_eq!(config.allowed_domains, vec!["x.com", "y.com"]);
        assert_eq!(config.allowed_emails, vec!["a@z.com"]);
        assert_eq!(config.provider.scope, "openid email");
        assert_eq!(config.provider.prompt.as_deref(), Some("select_account"));
        assert_eq!(config.provider.timeout, Duration::from_secs(3));
        assert_eq!(settings.listen_addr, "127.0.0.1:9000".parse().unwrap());
    }

    #[test]
    fn test_legacy_cookie_secret() {
        let vars: Vec<_> = REQUIRED
            .iter()
            .map(|&(k, v)| if k == "SECRET" { ("COOKIE_SECRET", v) } else { (k, v) })
            .collect();
        let settings = load_from(&vars).unwrap();
        assert_eq!(settings.forward_auth.secret.expose(), b"s3cret");
    }

    #[test]
    fn test_missing_required() {
        let vars: Vec<_> = REQUIRED
            .iter()
            .copied()
            .filter(|(k, _)| *k != "CLIENT_ID")
            .collect();
        assert!(matches!(
            load_from(&vars),
            Err(SettingsError::Missing("CLIENT_ID"))
        ));

        let vars: Vec<_> = REQUIRED
            .iter()
            .copied()
            .filter(|(k, _)| *k != "SECRET")
            .collect();
        assert!(matches!(load_from(&vars), Err(SettingsError::Missing("SECRET"))));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load_from(&with(&[("COOKIE_SECURE", "maybe")])),
            Err(SettingsError::Invalid { name: "COOKIE_SECURE", .. })
        ));
        assert!(matches!(
            load_from(&with(&[("LIFETIME", "12h")])),
            Err(SettingsError::Invalid { name: "LIFETIME", .. })
        ));
        assert!(matches!(
            load_from(&with(&[("LIFETIME", "0")])),
            Err(SettingsError::Config(ConfigError::Invalid(_)))
        ));
        assert!(matches!(
            load_from(&with(&[("LIFETIME", "18446744073709551615")])),
            Err(SettingsError::Config(ConfigError::Invalid(_)))
        ));
        assert!(matches!(
            load_from(&with(&[("LISTEN_ADDR", "nowhere")])),
            Err(SettingsError::Invalid { name: "LISTEN_ADDR", .. })
        ));
    }
}
