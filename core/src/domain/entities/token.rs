//! Token claim sets and the issued credential pair.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::account::Authority;
use super::refresh_record::RefreshRecord;

/// Name of the access-token claim listing the owner's authorities
pub const AUTHORITIES_CLAIM: &str = "authorities";

/// Claims carried by a short-lived access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (owner ID)
    pub sub: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Authorities of the owner at issue time
    #[serde(rename = "authorities")]
    pub authorities: Vec<String>,
}

impl AccessClaims {
    /// Creates access claims valid for `ttl` from `now`
    pub fn new(
        owner_id: Uuid,
        authorities: &BTreeSet<Authority>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: owner_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            authorities: authorities.iter().map(|a| a.as_str().to_string()).collect(),
        }
    }

    /// Gets the owner ID from the subject
    pub fn owner_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }

    /// Parses the authorities claim, skipping names this service does not know
    pub fn parsed_authorities(&self) -> BTreeSet<Authority> {
        self.authorities.iter().filter_map(|a| a.parse().ok()).collect()
    }
}

/// Claims carried by a refresh token
///
/// Deliberately has no authorities: a refresh token only re-proves identity
/// once it has been rotated successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject (owner ID)
    pub sub: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// ID of the backing refresh record
    pub jti: String,
}

impl RefreshClaims {
    /// Claims mirroring a stored record
    pub fn for_record(record: &RefreshRecord) -> Self {
        Self {
            sub: record.owner_id.to_string(),
            iat: record.issued_at.timestamp(),
            exp: record.expires_at.timestamp(),
            jti: record.id.to_string(),
        }
    }

    /// Gets the backing record ID
    pub fn record_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.jti)
    }

    /// Gets the owner ID from the subject
    pub fn owner_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }
}

/// Credential pair produced by `issue` and `refresh`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Signed access token
    pub access_token: String,

    /// Signed refresh token
    pub refresh_token: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// Authorities carried by the access token
    pub authorities: BTreeSet<Authority>,

    /// ID of the refresh record backing `refresh_token`
    pub refresh_record_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_claims() {
        let owner = Uuid::new_v4();
        let now = Utc::now();
        let authorities = BTreeSet::from([Authority::RoleUser, Authority::RoleAdmin]);
        let claims = AccessClaims::new(owner, &authorities, now, Duration::minutes(15));

        assert_eq!(claims.owner_id().unwrap(), owner);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
        assert_eq!(claims.authorities, vec!["ROLE_USER", "ROLE_ADMIN"]);
        assert_eq!(claims.parsed_authorities(), authorities);
    }

    #[test]
    fn test_refresh_claims_mirror_record() {
        let record = RefreshRecord::new(Uuid::new_v4(), Duration::days(30));
        let claims = RefreshClaims::for_record(&record);

        assert_eq!(claims.record_id().unwrap(), record.id);
        assert_eq!(claims.owner_id().unwrap(), record.owner_id);
        assert_eq!(claims.exp, record.expires_at.timestamp());

        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get(AUTHORITIES_CLAIM).is_none());
        assert_eq!(json["jti"], record.id.to_string());
    }

    #[test]
    fn test_unknown_authorities_are_ignored() {
        let claims = AccessClaims {
            sub: Uuid::new_v4().to_string(),
            iat: 0,
            exp: 1,
            authorities: vec!["ROLE_USER".to_string(), "ROLE_SUPERUSER".to_string()],
        };
        assert_eq!(claims.parsed_authorities(), BTreeSet::from([Authority::RoleUser]));
    }
}
