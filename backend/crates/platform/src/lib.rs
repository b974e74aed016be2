//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (HMAC-SHA256, constant-time compare, randomness, Base64url)
//! - Cookie management (`Set-Cookie` building, `Cookie` header parsing)
//! - Forwarded request reconstruction for reverse-proxy deployments

pub mod client;
pub mod cookie;
pub mod crypto;
