//! HTTP Handlers

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use platform::cookie::set_cookie_header;

use crate::application::authorizer::{AuthOutcome, RequestAuthorizer, Verdict};
use crate::domain::provider::IdentityProvider;
use crate::error::ForwardAuthError;

/// Identity of the allowed user, for the proxy to pass upstream
pub const X_FORWARDED_USER: &str = "x-forwarded-user";

/// Shared state for the forward-auth handler
pub struct ForwardAuthAppState<P>
where
    P: IdentityProvider + Send + Sync + 'static,
{
    pub authorizer: Arc<RequestAuthorizer<P>>,
}

impl<P> Clone for ForwardAuthAppState<P>
where
    P: IdentityProvider + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            authorizer: self.authorizer.clone(),
        }
    }
}

/// Any method, any path: the proxy's authorization sub-request
pub async fn forward_auth<P>(
    State(state): State<ForwardAuthAppState<P>>,
    headers: HeaderMap,
) -> Response
where
    P: IdentityProvider + Send + Sync + 'static,
{
    state.authorizer.authorize(&headers).await.into_response()
}

impl IntoResponse for AuthOutcome {
    fn into_response(self) -> Response {
        let mut response = match self.verdict {
            Verdict::Allow { email } => match HeaderValue::from_str(&email) {
                Ok(user) => (StatusCode::OK, [(X_FORWARDED_USER, user)]).into_response(),
                Err(_) => ForwardAuthError::Internal("email is not a valid header value".into())
                    .into_response(),
            },
            Verdict::Redirect { location } => match HeaderValue::from_str(&location) {
                Ok(location) => {
                    (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)])
                        .into_response()
                }
                Err(_) => {
                    ForwardAuthError::Internal("redirect target is not a valid header value".into())
                        .into_response()
                }
            },
            Verdict::Reject(err) => err.into_response(),
        };

        for cookie in self.set_cookies {
            match set_cookie_header(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode Set-Cookie header");
                }
            }
        }

        response
    }
}
