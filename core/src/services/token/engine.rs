//! Rotation engine: issues refresh chains, rotates heads and reacts to reuse

use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use mk_shared::config::ReuseRevocation;

use crate::domain::entities::account::{Account, AccountStatus};
use crate::domain::entities::refresh_record::RefreshRecord;
use crate::domain::entities::token::{AccessClaims, RefreshClaims, TokenPair};
use crate::domain::value_objects::Principal;
use crate::errors::{AuthError, CredentialFailure, DomainError, IncidentKind, TokenError};
use crate::repositories::{AccountDirectory, CredentialStore};

use super::clock::Clock;
use super::codec::TokenCodec;
use super::config::RotationEngineConfig;

/// Owner of the refresh-chain protocol
///
/// Every mutation of the credential store, apart from the scheduled prune,
/// goes through `issue`, `refresh` or `invalidate`.
pub struct RotationEngine<S, A, C>
where
    S: CredentialStore + 'static,
    A: AccountDirectory + 'static,
    C: TokenCodec + 'static,
{
    store: Arc<S>,
    accounts: Arc<A>,
    codec: Arc<C>,
    clock: Arc<dyn Clock>,
    config: RotationEngineConfig,
}

impl<S, A, C> RotationEngine<S, A, C>
where
    S: CredentialStore + 'static,
    A: AccountDirectory + 'static,
    C: TokenCodec + 'static,
{
    /// Creates a new engine
    ///
    /// # Arguments
    ///
    /// * `store` - Persistence for refresh records
    /// * `accounts` - Owner lookup and suspension
    /// * `codec` - Token signing and verification
    /// * `clock` - Time source for issue and expiry
    /// * `config` - Lifetimes and reuse policy
    pub fn new(
        store: Arc<S>,
        accounts: Arc<A>,
        codec: Arc<C>,
        clock: Arc<dyn Clock>,
        config: RotationEngineConfig,
    ) -> Self {
        Self {
            store,
            accounts,
            codec,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &RotationEngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Starts a new chain for an authenticated owner
    ///
    /// # Returns
    ///
    /// * `Ok(TokenPair)` - Access token plus the refresh token of the new head
    /// * `Err(DomainError)` - Owner unknown or inactive, or storage failure
    pub async fn issue(&self, owner_id: Uuid) -> Result<TokenPair, DomainError> {
        let account = self
            .accounts
            .find_by_id(owner_id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;
        if !account.is_active() {
            return Err(AuthError::AccountInactive.into());
        }

        let (record, pair) = self.mint(&account).await?;
        info!(owner_id = %owner_id, record_id = %record.id, "Issued new refresh chain");
        Ok(pair)
    }

    /// Rotates the presented refresh token into a successor
    ///
    /// # Returns
    ///
    /// * `Ok(TokenPair)` - The new pair; the presented token is now superseded
    /// * `Err(DomainError)` - Always the opaque invalid-credential outcome for
    ///   bad, expired, unknown or replayed tokens
    pub async fn refresh(&self, presented: &str) -> Result<TokenPair, DomainError> {
        let claims = self.verify_refresh(presented)?;
        let record_id = self.record_id(&claims)?;
        let now = self.clock.now();

        let record = match self.store.find_unexpired(record_id, now).await? {
            Some(record) => record,
            None => {
                warn!(record_id = %record_id, "Refresh rejected: no unexpired record");
                return Err(DomainError::invalid_credential(CredentialFailure::NotFound));
            }
        };

        let account = match self.accounts.find_active(record.owner_id).await? {
            Some(account) => account,
            None => {
                warn!(
                    owner_id = %record.owner_id,
                    record_id = %record.id,
                    "Refresh rejected: owner is not active"
                );
                return Err(DomainError::invalid_credential(CredentialFailure::NotFound));
            }
        };

        if !record.is_head() {
            return Err(self.reuse_detected(&record).await?);
        }

        let (successor, pair) = self.mint(&account).await?;
        if !self.store.attach_next(record.id, successor.id).await? {
            // Lost the race to a concurrent rotation of the same head
            self.store.delete_chain(successor.id).await?;
            return Err(self.reuse_detected(&record).await?);
        }

        debug!(
            owner_id = %record.owner_id,
            from = %record.id,
            to = %successor.id,
            "Rotated refresh record"
        );

        self.schedule_prune();
        Ok(pair)
    }

    /// Deletes the chain of the presented refresh token
    ///
    /// # Arguments
    ///
    /// * `presented` - Raw refresh token
    /// * `caller_owner_id` - Identity proven by the caller's access token
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The chain is gone
    /// * `Err(DomainError)` - Invalid credential; a foreign chain suspends the
    ///   caller and is deleted anyway
    pub async fn invalidate(
        &self,
        presented: &str,
        caller_owner_id: Uuid,
    ) -> Result<(), DomainError> {
        let claims = self.verify_refresh(presented)?;
        let record_id = self.record_id(&claims)?;

        let record = match self.store.find_by_id(record_id).await? {
            Some(record) => record,
            None => {
                warn!(record_id = %record_id, "Invalidate rejected: no such record");
                return Err(DomainError::invalid_credential(CredentialFailure::NotFound));
            }
        };

        if record.owner_id != caller_owner_id {
            error!(
                caller = %caller_owner_id,
                owner_id = %record.owner_id,
                record_id = %record.id,
                "INVESTIGATE: caller presented a refresh token it does not own; suspending caller"
            );
            self.accounts
                .change_status(caller_owner_id, AccountStatus::Suspended)
                .await?;
            self.store.delete_chain(record.id).await?;
            return Err(DomainError::security_incident(IncidentKind::OwnerMismatch));
        }

        if !record.is_head() {
            return Err(self.reuse_detected(&record).await?);
        }

        let deleted = self.store.delete_chain(record.id).await?;
        info!(owner_id = %record.owner_id, deleted, "Invalidated refresh chain");
        Ok(())
    }

    /// Verifies an access token and resolves the active owner behind it
    pub async fn authorize(&self, access_token: &str) -> Result<Principal, DomainError> {
        let claims = self.codec.verify_access(access_token).map_err(|e| {
            debug!(error = ?e, "Access token rejected");
            e
        })?;
        let owner_id = claims
            .owner_id()
            .map_err(|_| DomainError::invalid_credential(CredentialFailure::Malformed))?;

        if self.accounts.find_active(owner_id).await?.is_none() {
            warn!(owner_id = %owner_id, "Access token rejected: owner is not active");
            return Err(DomainError::invalid_credential(CredentialFailure::NotFound));
        }

        Ok(Principal {
            owner_id,
            authorities: claims.parsed_authorities(),
        })
    }

    /// Deletes every chain whose records have all expired
    pub async fn prune(&self) -> Result<usize, DomainError> {
        self.store.prune_expired(self.clock.now()).await
    }

    /// Signs a pair for a new head of `account`, then stores the head
    ///
    /// Nothing is stored when signing fails.
    async fn mint(&self, account: &Account) -> Result<(RefreshRecord, TokenPair), DomainError> {
        let now = self.clock.now();
        let record = RefreshRecord::issued_at(account.id, now, self.config.refresh_ttl);

        let access =
            AccessClaims::new(account.id, &account.authorities, now, self.config.access_ttl);
        let pair = TokenPair {
            access_token: self.codec.sign_access(&access)?,
            refresh_token: self.codec.sign_refresh(&RefreshClaims::for_record(&record))?,
            expires_in: self.config.access_ttl.num_seconds(),
            authorities: account.authorities.clone(),
            refresh_record_id: record.id,
        };

        let record = self.store.insert(record).await?;
        Ok((record, pair))
    }

    /// Revokes per policy after a superseded record was presented and
    /// returns the error the caller must see
    async fn reuse_detected(&self, record: &RefreshRecord) -> Result<DomainError, DomainError> {
        let deleted = match self.config.reuse_revocation {
            ReuseRevocation::WholeChain => self.store.delete_chain(record.id).await?,
            ReuseRevocation::Downstream => {
                // Re-read: a lost CAS means `record` predates the winner's pointer
                let next = match record.next {
                    Some(next) => Some(next),
                    None => self.store.find_by_id(record.id).await?.and_then(|r| r.next),
                };
                match next {
                    Some(next) => self.store.delete_downstream(next).await?,
                    None => 0,
                }
            }
        };

        error!(
            owner_id = %record.owner_id,
            record_id = %record.id,
            deleted,
            mode = ?self.config.reuse_revocation,
            "INVESTIGATE: superseded refresh token presented again; chain revoked"
        );

        Ok(DomainError::security_incident(IncidentKind::SupersededTokenReuse))
    }

    fn verify_refresh(&self, presented: &str) -> Result<RefreshClaims, DomainError> {
        self.codec.verify_refresh(presented).map_err(|e| {
            if let DomainError::Token(TokenError::InvalidCredential { cause }) = &e {
                warn!(%cause, "Refresh token rejected");
            }
            e
        })
    }

    fn record_id(&self, claims: &RefreshClaims) -> Result<Uuid, DomainError> {
        claims.record_id().map_err(|_| {
            warn!("Refresh token rejected: jti is not a record id");
            DomainError::invalid_credential(CredentialFailure::Malformed)
        })
    }

    /// Best-effort prune on the current runtime; failures are only logged
    fn schedule_prune(&self) {
        if !self.config.prune_on_refresh {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let store = self.store.clone();
        let now = self.clock.now();
        handle.spawn(async move {
            match store.prune_expired(now).await {
                Ok(0) => {}
                Ok(pruned) => info!(pruned, "Pruned expired refresh chains"),
                Err(e) => error!(error = %e, "Failed to prune expired refresh chains"),
            }
        });
    }
}
