//! Layered configuration loading
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults for the detected environment
//! 2. `config/<environment>.toml`, if present
//! 3. `APP__*` environment variables (`APP__AUTH__JWT__SECRET=...`)
//!
//! `.env` is loaded into the process environment before anything is read.

use config::{Config, File};
use mk_shared::config::{AppConfig, Environment, LoggingConfig};

use crate::InfrastructureError;

/// Prefix of environment variables that override configuration keys
pub const ENV_PREFIX: &str = "APP";

/// Load the application configuration for the current environment
pub fn load_config() -> Result<AppConfig, InfrastructureError> {
    dotenvy::dotenv().ok();
    load_config_for(Environment::from_env())
}

/// Load the application configuration for an explicit environment
pub fn load_config_for(environment: Environment) -> Result<AppConfig, InfrastructureError> {
    let mut defaults = AppConfig::from_env();
    defaults.environment = environment;
    defaults.logging = LoggingConfig::for_environment(environment);

    let defaults = Config::try_from(&defaults).map_err(config_error)?;

    let config: AppConfig = Config::builder()
        .add_source(defaults)
        .add_source(File::with_name(environment.config_name()).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(config_error)?
        .try_deserialize()
        .map_err(config_error)?;

    if config.environment.is_production() && config.auth.jwt.is_using_default_secret() {
        return Err(InfrastructureError::Config(
            "JWT secret must be set in production".to_string(),
        ));
    }

    tracing::debug!(environment = %config.environment, "Configuration loaded");
    Ok(config)
}

fn config_error(err: config::ConfigError) -> InfrastructureError {
    InfrastructureError::Config(err.to_string())
}
