//! Domain-specific error types and error handling.

mod types;

// Re-export all error types and utilities
pub use types::{AuthError, CredentialFailure, IncidentKind, TokenError};

use mk_shared::errors::{error_codes, ErrorResponse, IntoErrorResponse};
use thiserror::Error;

/// Core domain errors (general purpose)
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl DomainError {
    /// Shorthand for an ordinary credential rejection
    pub fn invalid_credential(cause: CredentialFailure) -> Self {
        DomainError::Token(TokenError::InvalidCredential { cause })
    }

    /// Shorthand for a rejection that was treated as a theft signal
    pub fn security_incident(incident: IncidentKind) -> Self {
        DomainError::Token(TokenError::SecurityIncident { incident })
    }

    /// True for every outcome the wire caller sees as "invalid credential",
    /// security incidents included
    pub fn is_invalid_credential(&self) -> bool {
        matches!(
            self,
            DomainError::Token(
                TokenError::InvalidCredential { .. } | TokenError::SecurityIncident { .. }
            )
        )
    }

    /// True if this failure triggered theft-response side effects
    pub fn is_security_incident(&self) -> bool {
        matches!(self, DomainError::Token(TokenError::SecurityIncident { .. }))
    }
}

impl IntoErrorResponse for DomainError {
    fn to_error_response(&self) -> ErrorResponse {
        match self {
            // Every credential failure looks the same from outside
            DomainError::Token(TokenError::InvalidCredential { .. })
            | DomainError::Token(TokenError::SecurityIncident { .. }) => {
                ErrorResponse::new(error_codes::INVALID_CREDENTIAL, "Invalid credential")
            }
            DomainError::Auth(AuthError::AccountInactive) => {
                ErrorResponse::new(error_codes::ACCOUNT_INACTIVE, "Account is not active")
            }
            DomainError::Auth(AuthError::AccountNotFound) => {
                ErrorResponse::new(error_codes::UNAUTHORIZED, "Unauthorized")
            }
            DomainError::Validation { message } => {
                ErrorResponse::new(error_codes::VALIDATION_ERROR, message.clone())
            }
            DomainError::Internal { .. }
            | DomainError::Token(TokenError::TokenGenerationFailed) => {
                ErrorResponse::new(error_codes::INTERNAL_ERROR, "Internal server error")
            }
        }
    }
}
