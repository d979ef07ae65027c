//! # Infrastructure Layer
//!
//! Concrete implementations behind the core crate's repository traits,
//! plus process-level plumbing for the authentication service.
//!
//! ## Architecture
//!
//! - **Database**: MySQL credential store and account directory using SQLx
//! - **Config**: layered configuration loading (defaults, files, environment)
//! - **Telemetry**: tracing subscriber initialisation
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)

// Re-export core types for convenience
pub use mk_core::errors::*;

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

pub mod config;
pub mod telemetry;

#[cfg(feature = "mysql")]
mod wiring;

#[cfg(feature = "mysql")]
pub use wiring::{initialize, AuthServices, MySqlAuthGateway, MySqlRotationEngine};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// General infrastructure error
    #[error("Infrastructure error: {0}")]
    General(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        DomainError::Internal {
            message: err.to_string(),
        }
    }
}
