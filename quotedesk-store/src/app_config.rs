use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::time::Duration;

use quotedesk_core::{Lifecycle, StoreResult};

use crate::backend::StoreBackend;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub submission: SubmissionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
    #[serde(default)]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout_secs() -> u64 { 3 }
fn default_operation_timeout_ms() -> u64 { 5_000 }

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
}

/// Optional override of the status transition graph, e.g.
///
/// ```toml
/// [lifecycle.transitions]
/// pending = ["paid", "cancelled"]
/// paid = ["completed"]
/// ```
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LifecycleConfig {
    pub transitions: Option<HashMap<String, Vec<String>>>,
}

impl LifecycleConfig {
    pub fn build(&self) -> StoreResult<Lifecycle> {
        match &self.transitions {
            Some(table) => Lifecycle::from_table(table),
            None => Ok(Lifecycle::forward_only()),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SubmissionConfig {
    #[serde(default = "default_max_id_attempts")]
    pub max_id_attempts: u32,
}

fn default_max_id_attempts() -> u32 { 3 }

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            max_id_attempts: default_max_id_attempts(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides are optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `QUOTEDESK__DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("QUOTEDESK").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotedesk_core::{OrderStatus, Transition};

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
            [database]
            url = "postgres://localhost/quotedesk"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.acquire_timeout(), Duration::from_secs(3));
        assert_eq!(config.database.operation_timeout(), Duration::from_millis(5_000));
        assert!(!config.database.run_migrations);
        assert_eq!(config.store.backend, StoreBackend::Postgres);
        assert_eq!(config.submission.max_id_attempts, 3);
        assert_eq!(config.lifecycle.build().unwrap(), Lifecycle::forward_only());
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml_str(
            r#"
            [database]
            url = "postgres://localhost/quotedesk"
            max_connections = 12
            operation_timeout_ms = 250

            [store]
            backend = "memory"

            [submission]
            max_id_attempts = 5

            [lifecycle.transitions]
            pending = ["paid", "cancelled"]
            paid = ["completed"]
            "#,
        )
        .unwrap();

        assert_eq!(config.database.max_connections, 12);
        assert_eq!(config.database.operation_timeout(), Duration::from_millis(250));
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.submission.max_id_attempts, 5);

        let lifecycle = config.lifecycle.build().unwrap();
        assert_eq!(
            lifecycle.check(OrderStatus::Pending, OrderStatus::Paid).unwrap(),
            Transition::Apply
        );
        assert!(lifecycle.check(OrderStatus::Pending, OrderStatus::Accepted).is_err());
    }

    #[test]
    fn test_missing_database_section_fails() {
        assert!(Config::from_toml_str("[store]\nbackend = \"memory\"\n").is_err());
    }
}
