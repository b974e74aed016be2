//! Shared Kernel - Domain-crossing minimal core
//!
//! Error vocabulary shared by every crate in the workspace:
//! - [`error::kind::ErrorKind`] - classification mapped onto HTTP status codes
//! - [`error::app_error::AppError`] - unified error carrying a public message
//!   and an internal detail
//!
//! Only things with a stable meaning across all crates belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
