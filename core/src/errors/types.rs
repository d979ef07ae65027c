//! Error types for authentication and credential handling
//!
//! Credential failures carry their internal cause for logging, but all of
//! them render the same message so callers cannot tell them apart.

use thiserror::Error;

/// Account-related errors raised while issuing credentials
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Account not found")]
    AccountNotFound,

    #[error("Account is not active")]
    AccountInactive,
}

/// Token-related errors
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Invalid credential")]
    InvalidCredential { cause: CredentialFailure },

    #[error("Invalid credential")]
    SecurityIncident { incident: IncidentKind },

    #[error("Token generation failed")]
    TokenGenerationFailed,
}

/// Internal reason an ordinary credential was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFailure {
    /// Not a well-formed token, or a required claim is missing or unparsable
    Malformed,
    /// Signature did not verify against the configured secret
    Signature,
    /// Token or backing record is past its expiry
    Expired,
    /// No record backs the token's id, or its owner is not active
    NotFound,
}

impl std::fmt::Display for CredentialFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialFailure::Malformed => write!(f, "malformed"),
            CredentialFailure::Signature => write!(f, "bad signature"),
            CredentialFailure::Expired => write!(f, "expired"),
            CredentialFailure::NotFound => write!(f, "not found"),
        }
    }
}

/// Theft signals that trigger revocation beyond the failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentKind {
    /// A refresh token whose record already has a successor was presented
    SupersededTokenReuse,
    /// A caller tried to invalidate a chain owned by somebody else
    OwnerMismatch,
}

impl std::fmt::Display for IncidentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncidentKind::SupersededTokenReuse => write!(f, "superseded token reuse"),
            IncidentKind::OwnerMismatch => write!(f, "owner mismatch"),
        }
    }
}
