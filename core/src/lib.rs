//! # Marketplace Core
//!
//! Refresh-token issuance, rotation and theft detection for the marketplace
//! authentication service. The crate holds the domain entities, the
//! repository interfaces the rotation protocol persists through, the
//! rotation engine itself, and the gateway used by the CRUD layers.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::{
    Account, AccountStatus, Authority, InvalidateRequest, Principal, RefreshRecord,
    RefreshTokenRequest, TokenPair, TokenResponse,
};
pub use errors::{AuthError, CredentialFailure, DomainError, IncidentKind, TokenError};
pub use repositories::{
    AccountDirectory, CredentialStore, InMemoryAccountDirectory, InMemoryCredentialStore,
};
pub use services::{AuthGateway, ChainPruner, JwtCodec, RotationEngine, TokenCodec};
