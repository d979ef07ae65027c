//! Token services for the refresh-chain protocol
//!
//! This module handles:
//! - Signing and verifying access and refresh tokens
//! - Issuing, rotating and invalidating refresh chains
//! - Reuse (theft) detection and chain revocation
//! - Background pruning of fully expired chains

mod cleanup;
mod clock;
mod codec;
mod config;
mod engine;

#[cfg(test)]
mod tests;

pub use cleanup::{ChainPruner, PruneReport};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{JwtCodec, TokenCodec};
pub use config::{hmac_algorithm, RotationEngineConfig};
pub use engine::RotationEngine;
