//! Auth gateway: the entry point the CRUD layers call
//!
//! Translates verified identities and raw wire tokens into engine calls and
//! engine results into wire shapes. Holds no state of its own.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::value_objects::{
    InvalidateRequest, Principal, RefreshTokenRequest, TokenResponse,
};
use crate::errors::{CredentialFailure, DomainError};
use crate::repositories::{AccountDirectory, CredentialStore};
use crate::services::token::{RotationEngine, TokenCodec};

const BEARER_PREFIX: &str = "Bearer ";

/// Facade over the rotation engine
pub struct AuthGateway<S, A, C>
where
    S: CredentialStore + 'static,
    A: AccountDirectory + 'static,
    C: TokenCodec + 'static,
{
    engine: Arc<RotationEngine<S, A, C>>,
}

impl<S, A, C> AuthGateway<S, A, C>
where
    S: CredentialStore + 'static,
    A: AccountDirectory + 'static,
    C: TokenCodec + 'static,
{
    pub fn new(engine: Arc<RotationEngine<S, A, C>>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<RotationEngine<S, A, C>> {
        &self.engine
    }

    /// Issue a credential pair for an identity the caller has already verified
    pub async fn authenticate(&self, owner_id: Uuid) -> Result<TokenResponse, DomainError> {
        self.engine.issue(owner_id).await.map(TokenResponse::from)
    }

    /// Exchange a refresh token for a new pair
    pub async fn refresh(
        &self,
        request: &RefreshTokenRequest,
    ) -> Result<TokenResponse, DomainError> {
        self.engine
            .refresh(&request.refresh_token)
            .await
            .map(TokenResponse::from)
    }

    /// Log out the session behind a refresh token
    ///
    /// # Arguments
    ///
    /// * `request` - Body carrying the refresh token to invalidate
    /// * `authorization` - The caller's access token, with or without the
    ///   `Bearer ` prefix; its subject must own the refresh chain
    pub async fn invalidate(
        &self,
        request: &InvalidateRequest,
        authorization: &str,
    ) -> Result<(), DomainError> {
        let principal = self.authorize(authorization).await?;
        self.engine
            .invalidate(&request.refresh_token, principal.owner_id)
            .await
    }

    /// Verify an access token and resolve the caller
    pub async fn authorize(&self, authorization: &str) -> Result<Principal, DomainError> {
        let token = bearer_token(authorization)
            .ok_or_else(|| DomainError::invalid_credential(CredentialFailure::Malformed))?;
        self.engine.authorize(token).await
    }
}

/// Strip an optional `Bearer ` prefix; `None` for an empty token
fn bearer_token(authorization: &str) -> Option<&str> {
    let token = authorization
        .strip_prefix(BEARER_PREFIX)
        .unwrap_or(authorization)
        .trim();
    (!token.is_empty()).then_some(token)
}
