//! Configuration for the rotation engine

use chrono::Duration;
use jsonwebtoken::Algorithm;
use mk_shared::config::{JwtConfig, ReuseRevocation, RotationConfig};

use crate::errors::DomainError;

/// Lifetimes and policy the engine runs with
#[derive(Debug, Clone)]
pub struct RotationEngineConfig {
    /// Access token lifetime
    pub access_ttl: Duration,
    /// Refresh record lifetime
    pub refresh_ttl: Duration,
    /// What to delete when a superseded token is replayed
    pub reuse_revocation: ReuseRevocation,
    /// Spawn a prune of expired chains after each successful refresh
    pub prune_on_refresh: bool,
}

impl Default for RotationEngineConfig {
    fn default() -> Self {
        Self {
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(30),
            reuse_revocation: ReuseRevocation::WholeChain,
            prune_on_refresh: true,
        }
    }
}

impl RotationEngineConfig {
    /// Build from the shared configuration sections
    pub fn from_config(jwt: &JwtConfig, rotation: &RotationConfig) -> Result<Self, DomainError> {
        if jwt.access_token_expiry <= 0 || jwt.refresh_token_expiry <= 0 {
            return Err(DomainError::Validation {
                message: "Token lifetimes must be positive".to_string(),
            });
        }

        Ok(Self {
            access_ttl: Duration::seconds(jwt.access_token_expiry),
            refresh_ttl: Duration::seconds(jwt.refresh_token_expiry),
            reuse_revocation: rotation.reuse_revocation,
            prune_on_refresh: rotation.prune_on_refresh,
        })
    }
}

/// Parse a configured HMAC algorithm name
///
/// Only the HMAC family is accepted; the codec signs with a shared secret.
pub fn hmac_algorithm(name: &str) -> Result<Algorithm, DomainError> {
    match name.to_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(DomainError::Validation {
            message: format!("Unsupported signing algorithm: {}", other),
        }),
    }
}
