//! Callback Use Case
//!
//! Completes a login: CSRF check, code exchange, user lookup, session issue.
//!
//! The allow-lists are not consulted here; the next request through the
//! session check applies them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use url::Url;

use crate::application::csrf_state::CsrfStateManager;
use crate::domain::cookie_codec::CookieCodec;
use crate::domain::payload::SessionPayload;
use crate::domain::provider::IdentityProvider;
use crate::error::{ForwardAuthError, ForwardAuthResult};

/// Callback input, taken from the forwarded URL and cookies
pub struct CallbackInput<'a> {
    pub csrf_cookie: Option<&'a str>,
    pub state: &'a str,
    pub code: &'a str,
    pub redirect_uri: &'a Url,
}

/// Callback output
#[derive(Debug)]
pub struct CallbackOutput {
    pub email: String,
    /// Where the browser was headed before login
    pub redirect: String,
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Callback use case
pub struct CallbackUseCase<P>
where
    P: IdentityProvider + Send + Sync + 'static,
{
    provider: Arc<P>,
    codec: Arc<CookieCodec>,
    csrf: Arc<CsrfStateManager>,
    lifetime: chrono::Duration,
}

impl<P> CallbackUseCase<P>
where
    P: IdentityProvider + Send + Sync + 'static,
{
    pub fn new(
        provider: Arc<P>,
        codec: Arc<CookieCodec>,
        csrf: Arc<CsrfStateManager>,
        lifetime: chrono::Duration,
    ) -> Self {
        Self {
            provider,
            codec,
            csrf,
            lifetime,
        }
    }

    pub async fn execute(
        &self,
        input: CallbackInput<'_>,
        now: DateTime<Utc>,
    ) -> ForwardAuthResult<CallbackOutput> {
        let redirect = self
            .csrf
            .complete_login(input.csrf_cookie, input.state, now)?;

        if input.code.is_empty() {
            return Err(ForwardAuthError::Exchange(
                "callback carried no authorization code".to_string(),
            ));
        }

        let token = self
            .provider
            .exchange_code(input.code, input.redirect_uri)
            .await?;
        let user = self.provider.fetch_user(&token).await?;

        let expires_at = now
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| ForwardAuthError::Internal("session expiry overflow".to_string()))?;
        let session_token = self
            .codec
            .sign(&SessionPayload::new(user.email.clone(), expires_at));

        tracing::info!(email = %user.email, expires_at = %expires_at, "Session issued");

        Ok(CallbackOutput {
            email: user.email,
            redirect,
            session_token,
            expires_at,
        })
    }
}
