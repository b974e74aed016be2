//! Request Authorizer
//!
//! Single entry point for every forwarded request. Routes to the callback
//! flow or the session-check flow and reports a verdict plus the cookies to
//! set.

use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use platform::client::{extract_forwarded_url, url_host};
use platform::cookie::{CookieConfig, cookie_names, extract_cookie};
use url::{Position, Url};

use crate::application::callback::{CallbackInput, CallbackUseCase};
use crate::application::check_session::{AuthzDecision, CheckSessionUseCase, DenyReason};
use crate::application::config::ForwardAuthConfig;
use crate::application::csrf_state::CsrfStateManager;
use crate::domain::cookie_codec::CookieCodec;
use crate::domain::domain_matcher::DomainMatcher;
use crate::domain::provider::IdentityProvider;
use crate::error::ForwardAuthError;

/// What the proxy should do with the request
#[derive(Debug)]
pub enum Verdict {
    /// Forward upstream
    Allow { email: String },
    /// Send the client elsewhere (provider login, or back after login)
    Redirect { location: String },
    Reject(ForwardAuthError),
}

/// Verdict plus `Set-Cookie` values to attach, whatever the verdict
#[derive(Debug)]
pub struct AuthOutcome {
    pub verdict: Verdict,
    pub set_cookies: Vec<String>,
}

impl AuthOutcome {
    fn new(verdict: Verdict) -> Self {
        Self {
            verdict,
            set_cookies: Vec::new(),
        }
    }

    fn reject(err: impl Into<ForwardAuthError>) -> Self {
        Self::new(Verdict::Reject(err.into()))
    }
}

/// Request authorizer
pub struct RequestAuthorizer<P>
where
    P: IdentityProvider + Send + Sync + 'static,
{
    config: Arc<ForwardAuthConfig>,
    provider: Arc<P>,
    matcher: Arc<DomainMatcher>,
    csrf: Arc<CsrfStateManager>,
    check_session: CheckSessionUseCase,
    callback: CallbackUseCase<P>,
}

impl<P> RequestAuthorizer<P>
where
    P: IdentityProvider + Send + Sync + 'static,
{
    pub fn new(config: Arc<ForwardAuthConfig>, provider: Arc<P>) -> Self {
        let codec = Arc::new(CookieCodec::new(config.secret.clone()));
        let matcher = Arc::new(config.domain_matcher());
        let csrf = Arc::new(CsrfStateManager::new(
            codec.clone(),
            config.csrf_cookie_name.clone(),
        ));

        Self {
            check_session: CheckSessionUseCase::new(codec.clone(), matcher.clone()),
            callback: CallbackUseCase::new(
                provider.clone(),
                codec,
                csrf.clone(),
                config.lifetime_chrono(),
            ),
            config,
            provider,
            matcher,
            csrf,
        }
    }

    pub async fn authorize(&self, headers: &HeaderMap) -> AuthOutcome {
        self.authorize_at(headers, Utc::now()).await
    }

    /// Decide for a request as of `now`
    pub async fn authorize_at(&self, headers: &HeaderMap, now: DateTime<Utc>) -> AuthOutcome {
        let url = match extract_forwarded_url(headers) {
            Ok(url) => url,
            Err(e) => return AuthOutcome::reject(e),
        };

        if url.path() == self.config.callback_path {
            self.handle_callback(headers, &url, now).await
        } else {
            self.handle_session(headers, &url, now)
        }
    }

    fn handle_session(&self, headers: &HeaderMap, url: &Url, now: DateTime<Utc>) -> AuthOutcome {
        let cookie = extract_cookie(headers, &self.config.cookie_name);
        let state = self.check_session.classify(cookie.as_deref(), now);

        match self.check_session.decide(state) {
            None => self.start_login(url, now),
            Some(AuthzDecision::Allow(email)) => {
                tracing::debug!(email = %email, "Session accepted");
                AuthOutcome::new(Verdict::Allow { email })
            }
            Some(AuthzDecision::Deny(DenyReason::InvalidCookie(e))) => AuthOutcome::reject(e),
            Some(AuthzDecision::Deny(DenyReason::NotAuthorized(email))) => {
                AuthOutcome::reject(ForwardAuthError::Unauthorized(email))
            }
        }
    }

    fn start_login(&self, url: &Url, now: DateTime<Utc>) -> AuthOutcome {
        let host = url_host(url);
        let redirect_uri = match self.login_redirect_uri(url, &host) {
            Ok(redirect_uri) => redirect_uri,
            Err(e) => return AuthOutcome::reject(e),
        };
        let login = self.csrf.begin_login(url.as_str(), now);
        let location = self.provider.login_url(&login.nonce, &redirect_uri);

        let csrf_cookie = self.csrf_cookie(&login.cookie_name, &host).build_set_cookie(
            &login.cookie_value,
            login.expires_at,
            now,
        );

        tracing::debug!(host = %host, redirect_uri = %redirect_uri, "No session, starting login");

        AuthOutcome {
            verdict: Verdict::Redirect {
                location: location.into(),
            },
            set_cookies: vec![csrf_cookie],
        }
    }

    async fn handle_callback(
        &self,
        headers: &HeaderMap,
        url: &Url,
        now: DateTime<Utc>,
    ) -> AuthOutcome {
        let host = url_host(url);
        let state = query_param(url, "state").unwrap_or_default();
        let code = query_param(url, "code").unwrap_or_default();

        let csrf_cookie_name = self.csrf.cookie_name_for_state(&state);
        let csrf_cookie = csrf_cookie_name
            .as_deref()
            .and_then(|name| extract_cookie(headers, name));
        let mut set_cookies = self.clear_csrf_cookies(
            headers,
            csrf_cookie_name.as_deref(),
            csrf_cookie.is_some(),
            &host,
        );

        let redirect_uri = match self.redirect_uri(url.scheme(), host_with_port(url)) {
            Ok(redirect_uri) => redirect_uri,
            Err(e) => {
                return AuthOutcome {
                    verdict: Verdict::Reject(e),
                    set_cookies,
                };
            }
        };

        let input = CallbackInput {
            csrf_cookie: csrf_cookie.as_deref(),
            state: &state,
            code: &code,
            redirect_uri: &redirect_uri,
        };

        let verdict = match self.callback.execute(input, now).await {
            Ok(output) => {
                set_cookies.push(self.session_cookie(&host).build_set_cookie(
                    &output.session_token,
                    output.expires_at,
                    now,
                ));
                Verdict::Redirect {
                    location: output.redirect,
                }
            }
            Err(e) => Verdict::Reject(e),
        };

        AuthOutcome {
            verdict,
            set_cookies,
        }
    }

    /// Deletions for the CSRF cookies a callback leaves behind
    ///
    /// The cookie named by `state` is always cleared. When the request does
    /// not carry it, every other CSRF cookie present is cleared as well.
    fn clear_csrf_cookies(
        &self,
        headers: &HeaderMap,
        state_cookie: Option<&str>,
        state_cookie_present: bool,
        host: &str,
    ) -> Vec<String> {
        let mut names: Vec<String> = state_cookie.map(str::to_string).into_iter().collect();
        if !state_cookie_present {
            let pending = cookie_names(headers)
                .into_iter()
                .filter(|name| Some(name.as_str()) != state_cookie)
                .filter(|name| self.csrf.owns_cookie(name));
            names.extend(pending);
        }

        names
            .iter()
            .map(|name| self.csrf_cookie(name, host).build_delete_cookie())
            .collect()
    }

    /// Callback URL handed to the provider at login start
    ///
    /// The central auth host is only used when it shares a cookie domain with
    /// the request host, otherwise the session cookie could not reach it.
    fn login_redirect_uri(&self, url: &Url, host: &str) -> Result<Url, ForwardAuthError> {
        match self.shared_auth_host(host) {
            Some(auth_host) => self.redirect_uri(url.scheme(), auth_host),
            None => self.redirect_uri(url.scheme(), host_with_port(url)),
        }
    }

    fn redirect_uri(&self, scheme: &str, authority: &str) -> Result<Url, ForwardAuthError> {
        let callback = format!("{}://{}{}", scheme, authority, self.config.callback_path);
        Url::parse(&callback)
            .map_err(|e| ForwardAuthError::Internal(format!("invalid callback url {callback}: {e}")))
    }

    fn shared_auth_host(&self, host: &str) -> Option<&str> {
        self.config
            .auth_host
            .as_deref()
            .filter(|auth_host| self.matcher.shares_cookie_domain(host, auth_host))
    }

    fn session_cookie(&self, host: &str) -> CookieConfig {
        let domain = self
            .matcher
            .select_cookie_domain(host)
            .map(|d| d.as_str().to_string());
        self.cookie(self.config.cookie_name.clone(), domain)
    }

    /// CSRF cookies are host-only unless the login round-trip crosses to the
    /// central auth host.
    fn csrf_cookie(&self, name: &str, host: &str) -> CookieConfig {
        let domain = self
            .shared_auth_host(host)
            .and_then(|_| self.matcher.select_cookie_domain(host))
            .map(|d| d.as_str().to_string());
        self.cookie(name.to_string(), domain)
    }

    fn cookie(&self, name: String, domain: Option<String>) -> CookieConfig {
        let mut cookie = CookieConfig::named(name)
            .with_domain(domain)
            .with_secure(self.config.cookie_secure);
        cookie.same_site = self.config.cookie_same_site;
        cookie
    }
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn host_with_port(url: &Url) -> &str {
    &url[Position::BeforeHost..Position::AfterPort]
}
