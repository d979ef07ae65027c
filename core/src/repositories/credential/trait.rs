//! Credential store trait defining the persistence surface of refresh chains.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::refresh_record::RefreshRecord;
use crate::errors::DomainError;

/// Persistence and query surface for refresh records
///
/// Records form chains through their `next` pointer. Implementations keep an
/// index on `next` so a chain can be walked backward as well as forward;
/// no business rules live here.
///
/// # Atomicity
/// `attach_next` must be a single conditional write: it succeeds only while
/// the record's `next` is still unset. Two concurrent rotations of the same
/// head must never both observe success.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist a new record
    ///
    /// # Returns
    /// * `Ok(RefreshRecord)` - The stored record
    /// * `Err(DomainError)` - Save failed (e.g., duplicate id)
    async fn insert(&self, record: RefreshRecord) -> Result<RefreshRecord, DomainError>;

    /// Find a record by id if it has not expired at `now`
    ///
    /// Superseded records are returned too; deciding what a non-head record
    /// means is the caller's business.
    async fn find_unexpired(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshRecord>, DomainError>;

    /// Find a record by id in any state
    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshRecord>, DomainError>;

    /// Set `next` on record `id` only if it is still unset
    ///
    /// # Returns
    /// * `Ok(true)` - The pointer was attached
    /// * `Ok(false)` - The record is missing or already superseded
    async fn attach_next(&self, id: Uuid, next: Uuid) -> Result<bool, DomainError>;

    /// All records connected to `id`, following `next` forward and the
    /// `next` index backward
    async fn find_chain(&self, id: Uuid) -> Result<Vec<RefreshRecord>, DomainError>;

    /// Delete every record connected to `id`
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records deleted (zero if `id` is unknown)
    async fn delete_chain(&self, id: Uuid) -> Result<usize, DomainError>;

    /// Delete `id` and every record reachable from it through `next`
    async fn delete_downstream(&self, id: Uuid) -> Result<usize, DomainError>;

    /// Delete every chain whose records have all expired at `now`
    ///
    /// Idempotent: re-running it, or running it concurrently, only ever
    /// removes chains that are already unusable.
    async fn prune_expired(&self, now: DateTime<Utc>) -> Result<usize, DomainError>;
}
