//! OAuth2 Client
//!
//! [`IdentityProvider`] over the provider's HTTP endpoints. The authorization
//! URL and the code exchange go through [`oauth2::basic::BasicClient`]; the
//! user-info endpoint is a plain bearer GET.

use std::borrow::Cow;
use std::time::Duration;

use oauth2::basic::BasicClient;
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use reqwest::{Client, header};
use serde::Deserialize;
use url::Url;

use crate::application::config::ProviderSettings;
use crate::domain::provider::{AccessToken, IdentityProvider, ProviderError, UserInfo};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

// Authorization and token endpoints set, nothing else
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    oauth2::EndpointSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointSet,
>;

#[derive(Deserialize)]
struct UserInfoResponse {
    #[serde(default)]
    email: Option<String>,
}

/// OAuth2 authorization-code client
///
/// Each call is bounded by the configured timeout and never retried. The
/// HTTP client follows no redirects.
#[derive(Debug, Clone)]
pub struct OAuth2Client {
    http: Client,
    oauth: ConfiguredClient,
    settings: ProviderSettings,
}

impl OAuth2Client {
    pub fn new(settings: ProviderSettings) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(settings.timeout))
            .timeout(settings.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        let client_secret = String::from_utf8_lossy(settings.client_secret.expose()).into_owned();
        // Credentials travel in the form body, as most providers accept
        let oauth = BasicClient::new(ClientId::new(settings.client_id.clone()))
            .set_client_secret(ClientSecret::new(client_secret))
            .set_auth_uri(AuthUrl::from_url(settings.login_url.clone()))
            .set_token_uri(TokenUrl::from_url(settings.token_url.clone()))
            .set_auth_type(AuthType::RequestBody);

        Ok(Self {
            http,
            oauth,
            settings,
        })
    }
}

impl IdentityProvider for OAuth2Client {
    fn login_url(&self, state: &str, redirect_uri: &Url) -> Url {
        let state = state.to_string();
        let mut request = self
            .oauth
            .authorize_url(|| CsrfToken::new(state))
            .set_redirect_uri(Cow::Owned(RedirectUrl::from_url(redirect_uri.clone())))
            .add_scopes(
                self.settings
                    .scope
                    .split_whitespace()
                    .map(|scope| Scope::new(scope.to_string())),
            );
        if let Some(prompt) = self.settings.prompt.as_deref().filter(|p| !p.is_empty()) {
            request = request.add_extra_param("prompt", prompt);
        }

        let (url, _state) = request.url();
        url
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &Url,
    ) -> Result<AccessToken, ProviderError> {
        let token = self
            .oauth
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_redirect_uri(Cow::Owned(RedirectUrl::from_url(redirect_uri.clone())))
            .request_async(&self.http)
            .await
            .map_err(|e| ProviderError::Exchange(e.to_string()))?;

        let access_token = token.access_token().secret();
        if access_token.is_empty() {
            return Err(ProviderError::Exchange("empty access token".to_string()));
        }

        Ok(AccessToken::new(access_token.clone()))
    }

    async fn fetch_user(&self, token: &AccessToken) -> Result<UserInfo, ProviderError> {
        let response = self
            .http
            .get(self.settings.user_url.clone())
            .header(header::ACCEPT, "application/json")
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| ProviderError::UserFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::UserFetch(format!(
                "user info endpoint returned {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::UserFetch(e.to_string()))?;
        let user: UserInfoResponse = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::UserFetch(format!("invalid user info: {e}")))?;

        match user.email {
            Some(email) if !email.is_empty() => Ok(UserInfo { email }),
            _ => Err(ProviderError::UserFetch(
                "user info has no email".to_string(),
            )),
        }
    }
}
