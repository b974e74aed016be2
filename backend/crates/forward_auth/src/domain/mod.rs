//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Cookie payloads (session, CSRF) and their signed encoding
//! - Cookie-domain selection and email authorization policy
//! - The identity provider port (interface only)

pub mod cookie_codec;
pub mod domain_matcher;
pub mod payload;
pub mod provider;
