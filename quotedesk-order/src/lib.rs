pub mod submission;
pub mod service;

pub use submission::{generate_order_id, normalize_project_type, OrderSubmission};
pub use service::OrderService;
