use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use quotedesk_core::{OrderRepository, StoreError, StoreResult};

use crate::app_config::Config;
use crate::database::DbClient;
use crate::memory_repo::InMemoryOrderRepository;

/// Which Order Store implementation to run against.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

/// Builds the configured repository, connecting (and optionally migrating) Postgres first.
pub async fn build_repository(config: &Config) -> StoreResult<Arc<dyn OrderRepository>> {
    let lifecycle = config.lifecycle.build()?;
    let operation_timeout = config.database.operation_timeout();

    match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory order store");
            Ok(Arc::new(
                InMemoryOrderRepository::new(lifecycle).with_operation_timeout(operation_timeout),
            ))
        }
        StoreBackend::Postgres => {
            let db = DbClient::new(&config.database)
                .await
                .map_err(|e| StoreError::Unavailable(format!("failed to connect to database: {}", e)))?;

            if config.database.run_migrations {
                db.migrate()
                    .await
                    .map_err(|e| StoreError::Internal(format!("migration failed: {}", e)))?;
            }

            info!("Using Postgres order store");
            Ok(Arc::new(db.order_repository(lifecycle, operation_timeout)))
        }
    }
}
