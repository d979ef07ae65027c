//! Shared configuration and common types for the marketplace auth services
//!
//! This crate provides functionality used by every server module:
//! - Configuration types (JWT, rotation policy, cleanup, database, logging)
//! - Error response structures and error codes

pub mod config;
pub mod errors;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CleanupConfig, DatabaseConfig, Environment, JwtConfig, LoggingConfig,
    ReuseRevocation, RotationConfig,
};
pub use errors::{error_codes, ErrorResponse, IntoErrorResponse};
