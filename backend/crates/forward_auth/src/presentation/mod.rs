//! Presentation Layer
//!
//! HTTP handler and router.

pub mod handlers;
pub mod router;

pub use handlers::ForwardAuthAppState;
pub use router::{forward_auth_router, forward_auth_router_generic};
