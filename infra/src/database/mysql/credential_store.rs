//! MySQL implementation of the CredentialStore trait.
//!
//! Refresh records live in `refresh_records`, one row per chain node. The
//! successor is the `next` column; predecessors are found through the index
//! on `next`. Rotation relies on a single conditional `UPDATE`, so two
//! concurrent rotations of one head cannot both succeed.
//!
//! Deletions and the prune walk the chain with locking reads. A rotation
//! racing a deletion either commits first, and its successor is found by the
//! walk, or blocks on the locked head and then matches no row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::{MySqlPool, Row};
use std::collections::{HashSet, VecDeque};
use uuid::Uuid;

use mk_core::domain::entities::refresh_record::RefreshRecord;
use mk_core::errors::DomainError;
use mk_core::repositories::CredentialStore;

const RECORD_COLUMNS: &str = "id, owner_id, issued_at, expires_at, next";

/// How a chain walk reads rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    /// Consistent snapshot, no locks
    Snapshot,
    /// `FOR UPDATE`; only meaningful inside a transaction
    Locking,
}

impl Walk {
    fn suffix(self) -> &'static str {
        match self {
            Walk::Snapshot => "",
            Walk::Locking => " FOR UPDATE",
        }
    }
}

/// MySQL implementation of CredentialStore
pub struct MySqlCredentialStore {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlCredentialStore {
    /// Create a new MySQL credential store
    ///
    /// # Arguments
    /// * `pool` - MySQL connection pool from SQLx
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to RefreshRecord entity
    fn row_to_record(row: &MySqlRow) -> Result<RefreshRecord, DomainError> {
        let id: String = row.try_get("id").map_err(internal("Failed to get id"))?;
        let owner_id: String = row
            .try_get("owner_id")
            .map_err(internal("Failed to get owner_id"))?;
        let next: Option<String> = row.try_get("next").map_err(internal("Failed to get next"))?;

        Ok(RefreshRecord {
            id: parse_uuid(&id)?,
            owner_id: parse_uuid(&owner_id)?,
            issued_at: row
                .try_get::<DateTime<Utc>, _>("issued_at")
                .map_err(internal("Failed to get issued_at"))?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(internal("Failed to get expires_at"))?,
            next: next.as_deref().map(parse_uuid).transpose()?,
        })
    }

    async fn fetch_record(
        conn: &mut MySqlConnection,
        id: Uuid,
        walk: Walk,
    ) -> Result<Option<RefreshRecord>, DomainError> {
        let query = format!(
            "SELECT {} FROM refresh_records WHERE id = ?{}",
            RECORD_COLUMNS,
            walk.suffix()
        );
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&mut *conn)
            .await
            .map_err(internal("Failed to find refresh record"))?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn fetch_predecessors(
        conn: &mut MySqlConnection,
        id: Uuid,
        walk: Walk,
    ) -> Result<Vec<RefreshRecord>, DomainError> {
        let query = format!(
            "SELECT {} FROM refresh_records WHERE next = ?{}",
            RECORD_COLUMNS,
            walk.suffix()
        );
        let rows = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_all(&mut *conn)
            .await
            .map_err(internal("Failed to find predecessor records"))?;

        rows.iter().map(Self::row_to_record).collect()
    }

    /// Every record connected to `start`, walking `next` forward and the
    /// `next` index backward
    async fn collect_chain(
        conn: &mut MySqlConnection,
        start: Uuid,
        walk: Walk,
    ) -> Result<Vec<RefreshRecord>, DomainError> {
        let Some(first) = Self::fetch_record(conn, start, walk).await? else {
            return Ok(Vec::new());
        };

        let mut seen = HashSet::from([first.id]);
        let mut queue = VecDeque::from([first.clone()]);
        let mut chain = vec![first];

        while let Some(record) = queue.pop_front() {
            let mut neighbours = Self::fetch_predecessors(conn, record.id, walk).await?;
            if let Some(next) = record.next {
                if let Some(successor) = Self::fetch_record(conn, next, walk).await? {
                    neighbours.push(successor);
                }
            }

            for neighbour in neighbours {
                if seen.insert(neighbour.id) {
                    queue.push_back(neighbour.clone());
                    chain.push(neighbour);
                }
            }
        }

        Ok(chain)
    }

    async fn delete_ids(conn: &mut MySqlConnection, ids: &[Uuid]) -> Result<usize, DomainError> {
        let mut deleted = 0;
        for id in ids {
            let result = sqlx::query("DELETE FROM refresh_records WHERE id = ?")
                .bind(id.to_string())
                .execute(&mut *conn)
                .await
                .map_err(internal("Failed to delete refresh record"))?;
            deleted += result.rows_affected() as usize;
        }
        Ok(deleted)
    }
}

#[async_trait]
impl CredentialStore for MySqlCredentialStore {
    async fn insert(&self, record: RefreshRecord) -> Result<RefreshRecord, DomainError> {
        let query = r#"
            INSERT INTO refresh_records (id, owner_id, issued_at, expires_at, next)
            VALUES (?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(record.id.to_string())
            .bind(record.owner_id.to_string())
            .bind(record.issued_at)
            .bind(record.expires_at)
            .bind(record.next.map(|n| n.to_string()))
            .execute(&self.pool)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db) if db.is_unique_violation() => DomainError::Validation {
                    message: "Refresh record already exists".to_string(),
                },
                _ => DomainError::Internal {
                    message: format!("Failed to save refresh record: {}", e),
                },
            })?;

        Ok(record)
    }

    async fn find_unexpired(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshRecord>, DomainError> {
        let query = format!(
            "SELECT {} FROM refresh_records WHERE id = ? AND expires_at > ?",
            RECORD_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id.to_string())
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal("Failed to find refresh record"))?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshRecord>, DomainError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(internal("Failed to acquire connection"))?;
        Self::fetch_record(&mut conn, id, Walk::Snapshot).await
    }

    async fn attach_next(&self, id: Uuid, next: Uuid) -> Result<bool, DomainError> {
        let query = "UPDATE refresh_records SET next = ? WHERE id = ? AND next IS NULL";

        let result = sqlx::query(query)
            .bind(next.to_string())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(internal("Failed to rotate refresh record"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_chain(&self, id: Uuid) -> Result<Vec<RefreshRecord>, DomainError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(internal("Failed to acquire connection"))?;

        let mut chain = Self::collect_chain(&mut conn, id, Walk::Snapshot).await?;
        chain.sort_by_key(|r| r.issued_at);
        Ok(chain)
    }

    async fn delete_chain(&self, id: Uuid) -> Result<usize, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(internal("Failed to begin transaction"))?;

        let ids: Vec<Uuid> = Self::collect_chain(&mut tx, id, Walk::Locking)
            .await?
            .iter()
            .map(|r| r.id)
            .collect();
        let deleted = Self::delete_ids(&mut tx, &ids).await?;

        tx.commit()
            .await
            .map_err(internal("Failed to commit chain deletion"))?;
        Ok(deleted)
    }

    async fn delete_downstream(&self, id: Uuid) -> Result<usize, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(internal("Failed to begin transaction"))?;

        let mut ids = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if ids.contains(&current) {
                break;
            }
            match Self::fetch_record(&mut tx, current, Walk::Locking).await? {
                Some(record) => {
                    ids.push(record.id);
                    cursor = record.next;
                }
                None => break,
            }
        }
        let deleted = Self::delete_ids(&mut tx, &ids).await?;

        tx.commit()
            .await
            .map_err(internal("Failed to commit downstream deletion"))?;
        Ok(deleted)
    }

    async fn prune_expired(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(internal("Failed to begin transaction"))?;

        let candidates: Vec<String> =
            sqlx::query_scalar("SELECT id FROM refresh_records WHERE expires_at <= ?")
                .bind(now)
                .fetch_all(&mut *tx)
                .await
                .map_err(internal("Failed to find expired refresh records"))?;

        let mut visited = HashSet::new();
        let mut doomed = Vec::new();
        for candidate in candidates {
            let candidate = parse_uuid(&candidate)?;
            if visited.contains(&candidate) {
                continue;
            }

            let chain = Self::collect_chain(&mut tx, candidate, Walk::Locking).await?;
            visited.extend(chain.iter().map(|r| r.id));
            if chain.iter().all(|r| r.is_expired_at(now)) {
                doomed.extend(chain.iter().map(|r| r.id));
            }
        }
        let deleted = Self::delete_ids(&mut tx, &doomed).await?;

        tx.commit()
            .await
            .map_err(internal("Failed to commit prune"))?;
        Ok(deleted)
    }
}

fn parse_uuid(value: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(value).map_err(|e| DomainError::Internal {
        message: format!("Invalid UUID in refresh_records: {}", e),
    })
}

fn internal(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::Internal {
        message: format!("{}: {}", context, e),
    }
}
