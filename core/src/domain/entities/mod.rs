//! Domain entities representing core business objects.

pub mod account;
pub mod refresh_record;
pub mod token;

// Re-export commonly used types
pub use account::{Account, AccountStatus, Authority};
pub use refresh_record::RefreshRecord;
pub use token::{AccessClaims, RefreshClaims, TokenPair, AUTHORITIES_CLAIM};
