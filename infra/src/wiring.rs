//! Assembly of the MySQL-backed authentication services

use std::sync::Arc;
use tokio::task::JoinHandle;

use mk_core::services::{
    AuthGateway, ChainPruner, Clock, JwtCodec, RotationEngine, RotationEngineConfig, SystemClock,
};
use mk_shared::config::AppConfig;

use crate::database::{DatabasePool, MySqlAccountDirectory, MySqlCredentialStore};
use crate::InfrastructureError;

pub type MySqlRotationEngine =
    RotationEngine<MySqlCredentialStore, MySqlAccountDirectory, JwtCodec>;
pub type MySqlAuthGateway = AuthGateway<MySqlCredentialStore, MySqlAccountDirectory, JwtCodec>;

/// Running authentication services
pub struct AuthServices {
    pub pool: DatabasePool,
    pub gateway: Arc<MySqlAuthGateway>,
    pub pruner: Arc<ChainPruner<MySqlCredentialStore>>,
    /// Background prune task, if pruning is enabled
    pub pruner_task: Option<JoinHandle<()>>,
}

impl AuthServices {
    /// Stop the background pruner and close the pool
    pub async fn shutdown(self) {
        if let Some(task) = self.pruner_task {
            task.abort();
        }
        self.pool.close().await;
        tracing::info!("Authentication services stopped");
    }
}

/// Connect to the database, apply migrations and wire the gateway
///
/// Must be called inside a tokio runtime; the chain pruner is spawned on it.
pub async fn initialize(config: &AppConfig) -> Result<AuthServices, InfrastructureError> {
    tracing::info!(environment = %config.environment, "Initializing authentication services");

    if config.auth.jwt.is_using_default_secret() {
        tracing::warn!("JWT secret is the built-in development default");
    }

    let pool = DatabasePool::new(config.database.clone()).await?;
    if !pool.health_check().await? {
        return Err(InfrastructureError::General("Database health check failed".to_string()));
    }
    pool.run_migrations().await?;
    tracing::info!("{}", pool.get_statistics());

    let store = Arc::new(MySqlCredentialStore::new(pool.get_pool().clone()));
    let accounts = Arc::new(MySqlAccountDirectory::new(pool.get_pool().clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let codec = Arc::new(
        JwtCodec::new(&config.auth.jwt, clock.clone())
            .map_err(|e| InfrastructureError::Config(e.to_string()))?,
    );
    let engine_config = RotationEngineConfig::from_config(&config.auth.jwt, &config.auth.rotation)
        .map_err(|e| InfrastructureError::Config(e.to_string()))?;

    let engine = RotationEngine::new(store.clone(), accounts, codec, clock.clone(), engine_config);
    let gateway = Arc::new(AuthGateway::new(Arc::new(engine)));

    let pruner = Arc::new(ChainPruner::new(store, clock, config.auth.cleanup.clone()));
    let pruner_task = pruner.clone().start_background_task();

    tracing::info!("Authentication services initialized successfully");

    Ok(AuthServices {
        pool,
        gateway,
        pruner,
        pruner_task,
    })
}
