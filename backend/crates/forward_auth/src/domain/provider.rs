//! Identity Provider Port
//!
//! Interface to the OAuth2 authorization-code flow. Implementation is in infrastructure layer.

use thiserror::Error;
use url::Url;

/// Provider access token; never printed
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Identity returned by the user-info endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub email: String,
}

/// Provider-side failures during the callback
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Code exchange failed; the code is single-use so this is not retried
    #[error("code exchange failed: {0}")]
    Exchange(String),

    /// User-info request failed, or the body carried no usable email
    #[error("user info fetch failed: {0}")]
    UserFetch(String),
}

/// Identity provider trait
#[trait_variant::make(IdentityProvider: Send)]
pub trait LocalIdentityProvider {
    /// Authorization URL the browser is sent to
    fn login_url(&self, state: &str, redirect_uri: &Url) -> Url;

    /// Exchange an authorization code for an access token
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &Url,
    ) -> Result<AccessToken, ProviderError>;

    /// Fetch the authenticated user's identity
    async fn fetch_user(&self, token: &AccessToken) -> Result<UserInfo, ProviderError>;
}
