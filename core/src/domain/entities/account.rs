//! Account view consumed by the rotation protocol.
//!
//! Accounts are owned by the user-management layer; this crate only reads
//! their status and authorities and, on a detected incident, suspends them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Authority granted to an account, carried in access tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Authority {
    RoleUser,
    RoleAdmin,
}

impl Authority {
    /// Claim value as it appears in the `authorities` array
    pub fn as_str(&self) -> &'static str {
        match self {
            Authority::RoleUser => "ROLE_USER",
            Authority::RoleAdmin => "ROLE_ADMIN",
        }
    }
}

impl std::fmt::Display for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Authority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROLE_USER" => Ok(Authority::RoleUser),
            "ROLE_ADMIN" => Ok(Authority::RoleAdmin),
            _ => Err(format!("Unknown authority: {}", s)),
        }
    }
}

/// Account lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Suspended,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Suspended => "SUSPENDED",
        }
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(AccountStatus::Active),
            "SUSPENDED" => Ok(AccountStatus::Suspended),
            _ => Err(format!("Unknown account status: {}", s)),
        }
    }
}

/// A principal that can own refresh chains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier, used as the token subject
    pub id: Uuid,

    /// Login e-mail, kept for incident logs
    pub email: String,

    /// Lifecycle status
    pub status: AccountStatus,

    /// Granted authorities
    pub authorities: BTreeSet<Authority>,
}

impl Account {
    /// Creates an active account holding `ROLE_USER`
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            status: AccountStatus::Active,
            authorities: BTreeSet::from([Authority::RoleUser]),
        }
    }

    /// Adds an authority
    pub fn with_authority(mut self, authority: Authority) -> Self {
        self.authorities.insert(authority);
        self
    }

    /// Whether the account may hold presentable credentials
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Suspends the account
    pub fn suspend(&mut self) {
        self.status = AccountStatus::Suspended;
    }
}
