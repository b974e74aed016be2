//! Forward-Auth Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Cookie payloads and codec, domain matching, identity provider trait
//! - `application/` - Configuration, CSRF state, use cases, request authorizer
//! - `infra/` - OAuth2 HTTP client
//! - `presentation/` - HTTP handler, router
//!
//! ## Flow
//! Every request the reverse proxy forwards is either the OAuth2 callback
//! (CSRF check, code exchange, user lookup, session cookie, redirect back) or
//! a protected request (session cookie check, allow-lists, or a redirect to
//! the provider's login page when there is no cookie).
//!
//! ## Security Model
//! - Stateless sessions: signed `{email, expiry}` cookies, HMAC-SHA256
//! - Per-login CSRF nonce carried as the OAuth2 `state`, signed with a one-hour expiry
//! - Signatures bound to their purpose, so a CSRF cookie never passes as a session
//! - Clients only ever see a status and a generic phrase

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::authorizer::{AuthOutcome, RequestAuthorizer, Verdict};
pub use application::config::{ConfigError, ForwardAuthConfig, ProviderSettings};
pub use domain::domain_matcher::CookieDomain;
pub use error::{ForwardAuthError, ForwardAuthResult};
pub use infra::oauth2::OAuth2Client;
pub use presentation::router::{forward_auth_router, forward_auth_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{app_error::AppError, kind::ErrorKind};
