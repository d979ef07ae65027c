//! Account directory trait: the slice of user management the rotation
//! protocol depends on.
//!
//! The directory is read to check that an owner is still active and to
//! load the authorities placed in access tokens. It is written to only when
//! a security incident suspends an account.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::account::{Account, AccountStatus};
use crate::errors::DomainError;

/// Lookup and status control for credential owners
///
/// # Example Implementation
/// ```no_run
/// use async_trait::async_trait;
/// use uuid::Uuid;
/// use mk_core::repositories::AccountDirectory;
/// use mk_core::domain::entities::account::{Account, AccountStatus};
/// use mk_core::errors::DomainError;
///
/// struct MySqlAccountDirectory {
///     // database connection pool
/// }
///
/// #[async_trait]
/// impl AccountDirectory for MySqlAccountDirectory {
///     async fn find_by_id(&self, owner_id: Uuid) -> Result<Option<Account>, DomainError> {
///         Ok(None)
///     }
///
///     async fn change_status(
///         &self,
///         owner_id: Uuid,
///         status: AccountStatus,
///     ) -> Result<bool, DomainError> {
///         Ok(false)
///     }
/// }
/// ```
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Find an account by id, in any status
    ///
    /// # Returns
    /// * `Ok(Some(Account))` - Account found
    /// * `Ok(None)` - No such account
    /// * `Err(DomainError)` - Lookup failed
    async fn find_by_id(&self, owner_id: Uuid) -> Result<Option<Account>, DomainError>;

    /// Set an account's status
    ///
    /// # Returns
    /// * `Ok(true)` - The account exists and now has `status`
    /// * `Ok(false)` - No such account
    async fn change_status(&self, owner_id: Uuid, status: AccountStatus)
        -> Result<bool, DomainError>;

    /// Find an account only if it is active
    async fn find_active(&self, owner_id: Uuid) -> Result<Option<Account>, DomainError> {
        Ok(self.find_by_id(owner_id).await?.filter(Account::is_active))
    }
}
