//! MySQL implementations of the core repository traits

pub mod account_directory;
pub mod credential_store;

pub use account_directory::MySqlAccountDirectory;
pub use credential_store::MySqlCredentialStore;
