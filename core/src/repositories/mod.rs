pub mod account;
pub mod credential;

pub use account::{AccountDirectory, InMemoryAccountDirectory};
pub use credential::{CredentialStore, InMemoryCredentialStore};
