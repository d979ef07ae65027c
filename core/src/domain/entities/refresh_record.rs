//! Refresh record entity: one node of a login session's rotation chain.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One node in a per-login-session chain of refresh credentials
///
/// Records reference their successor by id only. The inverse relation
/// ("which records point at me") is resolved by the store through an index
/// on `next`, never held in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRecord {
    /// Opaque identifier, embedded as the `jti` of the signed refresh token
    pub id: Uuid,

    /// Principal this record belongs to
    pub owner_id: Uuid,

    /// Timestamp when the record was issued
    pub issued_at: DateTime<Utc>,

    /// Timestamp after which the record is no longer presentable
    pub expires_at: DateTime<Utc>,

    /// Record that superseded this one; `None` while this is the chain head
    pub next: Option<Uuid>,
}

impl RefreshRecord {
    /// Creates a new chain head issued now
    ///
    /// # Arguments
    ///
    /// * `owner_id` - The principal's UUID
    /// * `ttl` - Refresh lifetime; `expires_at = issued_at + ttl`
    pub fn new(owner_id: Uuid, ttl: Duration) -> Self {
        Self::issued_at(owner_id, Utc::now(), ttl)
    }

    /// Creates a new chain head with an explicit issue time
    pub fn issued_at(owner_id: Uuid, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            issued_at,
            expires_at: issued_at + ttl,
            next: None,
        }
    }

    /// Whether the record has no successor
    pub fn is_head(&self) -> bool {
        self.next.is_none()
    }

    /// Whether the record is expired at `now` (`expires_at <= now`)
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_issued_head() {
        let owner = Uuid::new_v4();
        let record = RefreshRecord::new(owner, Duration::days(30));

        assert_eq!(record.owner_id, owner);
        assert!(record.is_head());
        assert_eq!(record.expires_at - record.issued_at, Duration::days(30));
        assert!(!record.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_superseded_record_is_not_head() {
        let mut record = RefreshRecord::new(Uuid::new_v4(), Duration::days(1));
        record.next = Some(Uuid::new_v4());

        assert!(!record.is_head());
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let issued = Utc::now() - Duration::hours(2);
        let record = RefreshRecord::issued_at(Uuid::new_v4(), issued, Duration::hours(1));

        assert!(record.is_expired_at(record.expires_at));
        assert!(!record.is_expired_at(record.expires_at - Duration::seconds(1)));
        assert!(record.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_ids_are_unique() {
        let owner = Uuid::new_v4();
        let a = RefreshRecord::new(owner, Duration::days(1));
        let b = RefreshRecord::new(owner, Duration::days(1));
        assert_ne!(a.id, b.id);
    }
}
