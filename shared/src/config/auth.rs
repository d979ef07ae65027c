//! Authentication configuration: token signing, lifetimes and rotation policy

use serde::{Deserialize, Serialize};

const DEFAULT_SECRET: &str = "development-secret-please-change-in-production";

/// JWT signing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// Shared secret for the HMAC signature
    pub secret: String,

    /// Access token expiry time in seconds
    #[serde(default = "default_access_expiry")]
    pub access_token_expiry: i64,

    /// Refresh token expiry time in seconds
    #[serde(default = "default_refresh_expiry")]
    pub refresh_token_expiry: i64,

    /// HMAC algorithm name (HS256, HS384 or HS512)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::from(DEFAULT_SECRET),
            access_token_expiry: default_access_expiry(),
            refresh_token_expiry: default_refresh_expiry(),
            algorithm: default_algorithm(),
        }
    }
}

impl JwtConfig {
    /// Create a new JWT configuration with secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Set access token expiry in minutes
    pub fn with_access_expiry_minutes(mut self, minutes: i64) -> Self {
        self.access_token_expiry = minutes * 60;
        self
    }

    /// Set refresh token expiry in days
    pub fn with_refresh_expiry_days(mut self, days: i64) -> Self {
        self.refresh_token_expiry = days * 86400;
        self
    }

    /// Check if using default secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            secret: std::env::var("JWT_SECRET").unwrap_or(defaults.secret),
            access_token_expiry: env_or("JWT_ACCESS_TOKEN_EXPIRY", defaults.access_token_expiry),
            refresh_token_expiry: env_or("JWT_REFRESH_TOKEN_EXPIRY", defaults.refresh_token_expiry),
            algorithm: std::env::var("JWT_ALGORITHM").unwrap_or(defaults.algorithm),
        }
    }
}

/// What to revoke when a superseded refresh token is presented again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReuseRevocation {
    /// Delete every record connected to the replayed one
    WholeChain,
    /// Delete only the successor of the replayed record and everything after it
    Downstream,
}

impl Default for ReuseRevocation {
    fn default() -> Self {
        ReuseRevocation::WholeChain
    }
}

impl std::str::FromStr for ReuseRevocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "whole_chain" | "whole-chain" | "chain" => Ok(ReuseRevocation::WholeChain),
            "downstream" => Ok(ReuseRevocation::Downstream),
            _ => Err(format!("Invalid reuse revocation mode: {}", s)),
        }
    }
}

/// Refresh-token rotation policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RotationConfig {
    /// Revocation target on detected reuse
    #[serde(default)]
    pub reuse_revocation: ReuseRevocation,

    /// Run a best-effort prune of expired chains after every successful refresh
    #[serde(default = "default_true")]
    pub prune_on_refresh: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            reuse_revocation: ReuseRevocation::default(),
            prune_on_refresh: true,
        }
    }
}

/// Scheduled pruning of fully expired refresh chains
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CleanupConfig {
    /// Whether the background sweep runs at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// How often to run the sweep (in seconds)
    #[serde(default = "default_cleanup_interval")]
    pub interval_seconds: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: default_cleanup_interval(),
        }
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT configuration
    #[serde(default)]
    pub jwt: JwtConfig,

    /// Rotation policy
    #[serde(default)]
    pub rotation: RotationConfig,

    /// Background pruning
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

impl AuthConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let rotation = RotationConfig {
            reuse_revocation: std::env::var("AUTH_REUSE_REVOCATION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            prune_on_refresh: env_or("AUTH_PRUNE_ON_REFRESH", true),
        };
        let cleanup = CleanupConfig {
            enabled: env_or("AUTH_CLEANUP_ENABLED", true),
            interval_seconds: env_or("AUTH_CLEANUP_INTERVAL", default_cleanup_interval()),
        };

        Self {
            jwt: JwtConfig::from_env(),
            rotation,
            cleanup,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

fn default_access_expiry() -> i64 {
    900 // 15 minutes
}

fn default_refresh_expiry() -> i64 {
    2_592_000 // 30 days
}

fn default_algorithm() -> String {
    String::from("HS512")
}

fn default_cleanup_interval() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}
