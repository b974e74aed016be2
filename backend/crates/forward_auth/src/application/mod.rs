pub mod authorizer;
pub mod callback;
pub mod check_session;
pub mod config;
pub mod csrf_state;
