mod cleanup_tests;
mod codec_tests;

use chrono::Duration;
use mk_shared::config::JwtConfig;
use std::sync::Arc;

use crate::domain::entities::account::Account;
use crate::repositories::{InMemoryAccountDirectory, InMemoryCredentialStore};

use super::{JwtCodec, ManualClock, RotationEngine, RotationEngineConfig};

pub(super) type TestEngine =
    RotationEngine<InMemoryCredentialStore, InMemoryAccountDirectory, JwtCodec>;

/// Engine wired to in-memory collaborators and a manual clock
pub(super) struct Harness {
    pub engine: TestEngine,
    pub store: Arc<InMemoryCredentialStore>,
    pub accounts: Arc<InMemoryAccountDirectory>,
    pub codec: Arc<JwtCodec>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(RotationEngineConfig {
            prune_on_refresh: false,
            ..RotationEngineConfig::default()
        })
    }

    pub fn with_config(config: RotationEngineConfig) -> Self {
        let store = Arc::new(InMemoryCredentialStore::new());
        let accounts = Arc::new(InMemoryAccountDirectory::new());
        let clock = Arc::new(ManualClock::starting_now());
        let codec = Arc::new(JwtCodec::new(&JwtConfig::new("test-secret"), clock.clone()).unwrap());
        let engine = RotationEngine::new(
            store.clone(),
            accounts.clone(),
            codec.clone(),
            clock.clone(),
            config,
        );

        Self {
            engine,
            store,
            accounts,
            codec,
            clock,
        }
    }

    pub async fn account(&self, email: &str) -> Account {
        self.accounts.insert(Account::new(email)).await
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }
}
