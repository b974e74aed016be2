//! Forward-Auth Router

use axum::Router;
use std::sync::Arc;

use crate::application::authorizer::RequestAuthorizer;
use crate::application::config::ForwardAuthConfig;
use crate::domain::provider::IdentityProvider;
use crate::infra::oauth2::OAuth2Client;
use crate::presentation::handlers::{self, ForwardAuthAppState};

/// Create the forward-auth router with the HTTP OAuth2 client
pub fn forward_auth_router(provider: OAuth2Client, config: ForwardAuthConfig) -> Router {
    forward_auth_router_generic(provider, config)
}

/// Create a generic forward-auth router for any identity provider
///
/// Every request, whatever its method or path, reaches the same handler.
pub fn forward_auth_router_generic<P>(provider: P, config: ForwardAuthConfig) -> Router
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let state = ForwardAuthAppState {
        authorizer: Arc::new(RequestAuthorizer::new(Arc::new(config), Arc::new(provider))),
    };

    Router::new()
        .fallback(handlers::forward_auth::<P>)
        .with_state(state)
}
