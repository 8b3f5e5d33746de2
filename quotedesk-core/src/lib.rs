pub mod error;
pub mod models;
pub mod status;
pub mod repository;
pub mod pricing;

pub use error::{StoreError, StoreResult};
pub use models::{NewOrder, Order, OrderFilter};
pub use status::{Lifecycle, OrderStatus, Transition};
pub use repository::OrderRepository;
pub use pricing::{FixedQuote, PricingRequest, QuotePricer};
