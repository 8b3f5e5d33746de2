pub mod app_config;
pub mod database;
pub mod order_repo;
pub mod memory_repo;
pub mod backend;
mod timeout;

pub use app_config::Config;
pub use database::DbClient;
pub use order_repo::PgOrderRepository;
pub use memory_repo::InMemoryOrderRepository;
pub use backend::{build_repository, StoreBackend};
