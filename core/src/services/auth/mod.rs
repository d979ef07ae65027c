//! Authentication gateway module
//!
//! The surface the CRUD layers use to authenticate, refresh and invalidate
//! credential pairs, and to resolve callers from access tokens.

mod gateway;

pub use gateway::AuthGateway;
