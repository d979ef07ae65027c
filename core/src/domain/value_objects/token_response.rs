//! Wire shapes of the gateway's requests and responses.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::domain::entities::account::Authority;
use crate::domain::entities::token::TokenPair;

/// Response of `authenticate` and `refresh`
///
/// ```json
/// {
///     "accessToken": "eyJ...",
///     "refreshToken": "eyJ...",
///     "expiresIn": 900,
///     "authorities": ["ROLE_USER"]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Signed access token
    pub access_token: String,

    /// Signed refresh token
    pub refresh_token: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// Authorities carried by the access token
    pub authorities: BTreeSet<Authority>,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in: pair.expires_in,
            authorities: pair.authorities,
        }
    }
}

/// Body of a refresh request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Body of an invalidate (logout) request; same shape as a refresh request
pub type InvalidateRequest = RefreshTokenRequest;

/// Identity proven by a verified access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub owner_id: Uuid,
    pub authorities: BTreeSet<Authority>,
}
