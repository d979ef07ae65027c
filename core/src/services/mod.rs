//! Business services containing the rotation protocol and its entry point.

pub mod auth;
pub mod token;

// Re-export commonly used types
pub use auth::AuthGateway;
pub use token::{
    ChainPruner, Clock, JwtCodec, ManualClock, PruneReport, RotationEngine, RotationEngineConfig,
    SystemClock, TokenCodec,
};
