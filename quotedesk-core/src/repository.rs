use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::{NewOrder, Order, OrderFilter};
use crate::status::OrderStatus;

/// Repository trait for order data access.
///
/// Implementations own `id` generation and enforce `order_id` uniqueness
/// atomically with the insert. `update_order_status` and `set_payment_method`
/// are read-modify-write operations that must not lose concurrent updates.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Validates and stores a new order, assigning `id`, `created_at` and `updated_at`.
    async fn create_order(&self, order: NewOrder) -> StoreResult<Order>;

    /// Looks up an order by its client-facing `order_id`.
    async fn get_order(&self, order_id: &str) -> StoreResult<Order>;

    /// Looks up an order by its surrogate `id`.
    async fn get_order_by_id(&self, id: i64) -> StoreResult<Order>;

    /// Orders matching `filter`, oldest first (`created_at`, then `id`).
    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>>;

    /// Moves an order to `status` if the store's lifecycle allows it.
    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> StoreResult<Order>;

    /// Records (or overwrites) the payment method. Status is left untouched.
    async fn set_payment_method(&self, order_id: &str, payment_method: &str) -> StoreResult<Order>;
}
