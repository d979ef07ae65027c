//! In-memory credential store
//!
//! Records live in an arena keyed by id, with a reverse index from a
//! record to the records whose `next` points at it. All mutation happens
//! under one write lock, so `attach_next` is a true compare-and-swap.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::refresh_record::RefreshRecord;
use crate::errors::DomainError;

use super::r#trait::CredentialStore;

#[derive(Default)]
struct Arena {
    records: HashMap<Uuid, RefreshRecord>,
    /// record id -> ids of records whose `next` is that record
    previous: HashMap<Uuid, HashSet<Uuid>>,
}

impl Arena {
    fn chain_ids(&self, start: Uuid) -> Vec<Uuid> {
        if !self.records.contains_key(&start) {
            return Vec::new();
        }

        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            let forward = self.records.get(&id).and_then(|r| r.next);
            let backward = self.previous.get(&id).into_iter().flatten().copied();
            for neighbour in forward.into_iter().chain(backward) {
                if self.records.contains_key(&neighbour) && seen.insert(neighbour) {
                    queue.push_back(neighbour);
                }
            }
        }
        seen.into_iter().collect()
    }

    fn downstream_ids(&self, start: Uuid) -> Vec<Uuid> {
        let mut ids = Vec::new();
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            let Some(record) = self.records.get(&id) else {
                break;
            };
            if ids.contains(&id) {
                break;
            }
            ids.push(id);
            cursor = record.next;
        }
        ids
    }

    fn remove(&mut self, ids: &[Uuid]) -> usize {
        let mut removed = 0;
        for id in ids {
            if let Some(record) = self.records.remove(id) {
                if let Some(next) = record.next {
                    if let Some(preds) = self.previous.get_mut(&next) {
                        preds.remove(id);
                        if preds.is_empty() {
                            self.previous.remove(&next);
                        }
                    }
                }
                removed += 1;
            }
            self.previous.remove(id);
        }
        removed
    }
}

/// Credential store backed by process memory
///
/// Suitable for tests and single-instance deployments; state is lost on
/// restart.
pub struct InMemoryCredentialStore {
    arena: RwLock<Arena>,
}

impl InMemoryCredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            arena: RwLock::new(Arena::default()),
        }
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.arena.read().await.records.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.arena.read().await.records.is_empty()
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn insert(&self, record: RefreshRecord) -> Result<RefreshRecord, DomainError> {
        let mut arena = self.arena.write().await;

        if arena.records.contains_key(&record.id) {
            return Err(DomainError::Validation {
                message: "Refresh record already exists".to_string(),
            });
        }

        if let Some(next) = record.next {
            arena.previous.entry(next).or_default().insert(record.id);
        }
        arena.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_unexpired(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshRecord>, DomainError> {
        let arena = self.arena.read().await;
        Ok(arena
            .records
            .get(&id)
            .filter(|r| !r.is_expired_at(now))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshRecord>, DomainError> {
        let arena = self.arena.read().await;
        Ok(arena.records.get(&id).cloned())
    }

    async fn attach_next(&self, id: Uuid, next: Uuid) -> Result<bool, DomainError> {
        let mut arena = self.arena.write().await;

        match arena.records.get_mut(&id) {
            Some(record) if record.next.is_none() => {
                record.next = Some(next);
            }
            _ => return Ok(false),
        }
        arena.previous.entry(next).or_default().insert(id);
        Ok(true)
    }

    async fn find_chain(&self, id: Uuid) -> Result<Vec<RefreshRecord>, DomainError> {
        let arena = self.arena.read().await;
        let mut chain: Vec<_> = arena
            .chain_ids(id)
            .iter()
            .filter_map(|id| arena.records.get(id).cloned())
            .collect();
        chain.sort_by_key(|r| r.issued_at);
        Ok(chain)
    }

    async fn delete_chain(&self, id: Uuid) -> Result<usize, DomainError> {
        let mut arena = self.arena.write().await;
        let ids = arena.chain_ids(id);
        Ok(arena.remove(&ids))
    }

    async fn delete_downstream(&self, id: Uuid) -> Result<usize, DomainError> {
        let mut arena = self.arena.write().await;
        let ids = arena.downstream_ids(id);
        Ok(arena.remove(&ids))
    }

    async fn prune_expired(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut arena = self.arena.write().await;

        let mut visited = HashSet::new();
        let mut doomed = Vec::new();
        let starts: Vec<Uuid> = arena.records.keys().copied().collect();
        for start in starts {
            if visited.contains(&start) {
                continue;
            }
            let chain = arena.chain_ids(start);
            visited.extend(chain.iter().copied());

            let all_expired = chain
                .iter()
                .filter_map(|id| arena.records.get(id))
                .all(|r| r.is_expired_at(now));
            if all_expired {
                doomed.extend(chain);
            }
        }

        Ok(arena.remove(&doomed))
    }
}
