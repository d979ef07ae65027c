//! Scheduled pruning of refresh chains whose records have all expired
//!
//! Expired chains are never presentable, so removing them only reclaims
//! storage. The sweep is idempotent and safe to run alongside the
//! opportunistic prune the engine spawns after a refresh.

use mk_shared::config::CleanupConfig;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::errors::DomainError;
use crate::repositories::CredentialStore;

use super::clock::Clock;

/// Runs the expired-chain sweep once or on an interval
pub struct ChainPruner<S: CredentialStore + 'static> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: CleanupConfig,
}

impl<S: CredentialStore> ChainPruner<S> {
    /// Create a new pruner
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: CleanupConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Run a single sweep
    ///
    /// # Returns
    /// * `Ok(PruneReport)` - Summary; store failures are recorded in `errors`
    /// * `Err(DomainError)` - Reserved for failures outside the sweep itself
    pub async fn run_prune(&self) -> Result<PruneReport, DomainError> {
        if !self.config.enabled {
            return Ok(PruneReport::default());
        }

        let mut report = PruneReport::default();

        match self.store.prune_expired(self.clock.now()).await {
            Ok(count) => {
                report.records_deleted = count;
                info!("Pruned {} expired refresh records", count);
            }
            Err(e) => {
                error!("Failed to prune expired refresh chains: {}", e);
                report.errors.push(format!("Prune error: {}", e));
            }
        }

        Ok(report)
    }

    /// Start the sweep as a background task
    ///
    /// Returns `None` when pruning is disabled.
    pub fn start_background_task(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("Refresh chain pruning is disabled");
            return None;
        }

        let interval = std::time::Duration::from_secs(self.config.interval_seconds.max(1));

        Some(tokio::spawn(async move {
            info!(
                "Refresh chain pruner started - will run every {} seconds",
                self.config.interval_seconds
            );

            let mut interval_timer = tokio::time::interval(interval);

            loop {
                interval_timer.tick().await;

                match self.run_prune().await {
                    Ok(report) if !report.is_success() => {
                        warn!("Prune completed with errors: {:?}", report.errors);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("Prune cycle failed: {}", e);
                    }
                }
            }
        }))
    }
}

/// Result of a prune sweep
#[derive(Debug, Default)]
pub struct PruneReport {
    /// Number of refresh records deleted
    pub records_deleted: usize,
    /// Any errors encountered during the sweep
    pub errors: Vec<String>,
}

impl PruneReport {
    /// Check if the sweep ran without errors
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}
