//! Value objects exchanged with the callers of the auth gateway.

pub mod token_response;

pub use token_response::{InvalidateRequest, Principal, RefreshTokenRequest, TokenResponse};
