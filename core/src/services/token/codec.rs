//! Token codec: signs and verifies the compact tokens handed to clients

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mk_shared::config::JwtConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::domain::entities::token::{AccessClaims, RefreshClaims};
use crate::errors::{CredentialFailure, DomainError, TokenError};

use super::clock::Clock;
use super::config::hmac_algorithm;

/// Signs claim sets into tokens and verifies tokens back into claims
///
/// Verification failures are reported as `TokenError::InvalidCredential`
/// carrying the internal cause.
pub trait TokenCodec: Send + Sync {
    fn sign_access(&self, claims: &AccessClaims) -> Result<String, DomainError>;

    fn sign_refresh(&self, claims: &RefreshClaims) -> Result<String, DomainError>;

    fn verify_access(&self, token: &str) -> Result<AccessClaims, DomainError>;

    fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, DomainError>;
}

/// HMAC-signed JWT codec
pub struct JwtCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl JwtCodec {
    /// Creates a codec from the JWT configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Secret and algorithm name
    /// * `clock` - Time source used for the expiry check
    ///
    /// # Returns
    ///
    /// The codec, or a validation error for an empty secret or a
    /// non-HMAC algorithm
    pub fn new(config: &JwtConfig, clock: Arc<dyn Clock>) -> Result<Self, DomainError> {
        if config.secret.is_empty() {
            return Err(DomainError::Validation {
                message: "JWT secret must not be empty".to_string(),
            });
        }

        let algorithm = hmac_algorithm(&config.algorithm)?;
        let secret = config.secret.as_bytes();

        // Expiry is checked against `clock`, with no leeway
        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            clock,
        })
    }

    /// Algorithm tokens are signed with
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, DomainError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|_| DomainError::Token(TokenError::TokenGenerationFailed))
    }

    fn verify<T: DeserializeOwned>(
        &self,
        token: &str,
        exp: impl Fn(&T) -> i64,
    ) -> Result<T, DomainError> {
        let data = decode::<T>(token, &self.decoding_key, &self.validation).map_err(|e| {
            let cause = match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    CredentialFailure::Signature
                }
                ErrorKind::ExpiredSignature => CredentialFailure::Expired,
                _ => CredentialFailure::Malformed,
            };
            DomainError::invalid_credential(cause)
        })?;

        if exp(&data.claims) <= self.clock.now().timestamp() {
            return Err(DomainError::invalid_credential(CredentialFailure::Expired));
        }

        Ok(data.claims)
    }
}

impl TokenCodec for JwtCodec {
    fn sign_access(&self, claims: &AccessClaims) -> Result<String, DomainError> {
        self.sign(claims)
    }

    fn sign_refresh(&self, claims: &RefreshClaims) -> Result<String, DomainError> {
        self.sign(claims)
    }

    fn verify_access(&self, token: &str) -> Result<AccessClaims, DomainError> {
        self.verify(token, |c: &AccessClaims| c.exp)
    }

    fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, DomainError> {
        self.verify(token, |c: &RefreshClaims| c.exp)
    }
}
