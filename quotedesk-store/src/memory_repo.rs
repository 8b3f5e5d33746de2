//! In-memory Order Store.
//!
//! Every mutation runs inside one write-lock critical section, which gives the
//! same guarantees the Postgres backend gets from its unique index and row locks.
//! Nothing survives a restart.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use quotedesk_core::{
    Lifecycle, NewOrder, Order, OrderFilter, OrderRepository, OrderStatus, StoreError, StoreResult,
    Transition,
};
use quotedesk_shared::pii::mask_email;

use crate::timeout::bounded;

const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct MemoryState {
    /// Last assigned surrogate id. Only ever grows.
    last_id: i64,
    orders: BTreeMap<i64, Order>,
    by_order_id: HashMap<String, i64>,
}

impl MemoryState {
    fn get_mut(&mut self, order_id: &str) -> StoreResult<&mut Order> {
        let id = self
            .by_order_id
            .get(order_id)
            .ok_or_else(|| StoreError::NotFound(order_id.to_string()))?;
        self.orders
            .get_mut(id)
            .ok_or_else(|| StoreError::Internal(format!("index points at missing order {}", id)))
    }
}

#[derive(Clone)]
pub struct InMemoryOrderRepository {
    state: Arc<RwLock<MemoryState>>,
    lifecycle: Arc<Lifecycle>,
    operation_timeout: Duration,
}

impl InMemoryOrderRepository {
    pub fn new(lifecycle: Lifecycle) -> Self {
        Self {
            state: Arc::new(RwLock::new(MemoryState::default())),
            lifecycle: Arc::new(lifecycle),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    pub fn with_operation_timeout(mut self, operation_timeout: Duration) -> Self {
        self.operation_timeout = operation_timeout;
        self
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.orders.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryOrderRepository {
    fn default() -> Self {
        Self::new(Lifecycle::forward_only())
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create_order(&self, order: NewOrder) -> StoreResult<Order> {
        order.validate()?;

        bounded(self.operation_timeout, "create_order", async {
            let mut state = self.state.write().await;

            if state.by_order_id.contains_key(&order.order_id) {
                return Err(StoreError::DuplicateOrderId(order.order_id));
            }

            state.last_id += 1;
            let id = state.last_id;
            let created = order.into_order(id, Utc::now());

            state.by_order_id.insert(created.order_id.clone(), id);
            state.orders.insert(id, created.clone());

            info!(
                "Order {} created for {} with quote {} ({})",
                created.order_id,
                mask_email(&created.client_email),
                created.quote,
                created.status
            );
            Ok(created)
        })
        .await
    }

    async fn get_order(&self, order_id: &str) -> StoreResult<Order> {
        bounded(self.operation_timeout, "get_order", async {
            let state = self.state.read().await;
            state
                .by_order_id
                .get(order_id)
                .and_then(|id| state.orders.get(id))
                .cloned()
                .ok_or_else(|| StoreError::NotFound(order_id.to_string()))
        })
        .await
    }

    async fn get_order_by_id(&self, id: i64) -> StoreResult<Order> {
        bounded(self.operation_timeout, "get_order_by_id", async {
            let state = self.state.read().await;
            state
                .orders
                .get(&id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(format!("id {}", id)))
        })
        .await
    }

    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        bounded(self.operation_timeout, "list_orders", async {
            let state = self.state.read().await;
            let mut orders: Vec<Order> = state
                .orders
                .values()
                .filter(|order| filter.matches(order))
                .cloned()
                .collect();
            drop(state);

            orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            if let Some(limit) = filter.limit {
                orders.truncate(limit);
            }
            Ok(orders)
        })
        .await
    }

    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> StoreResult<Order> {
        bounded(self.operation_timeout, "update_order_status", async {
            let mut state = self.state.write().await;
            let order = state.get_mut(order_id)?;
            let from = order.status;

            if self.lifecycle.check(from, status)? == Transition::Unchanged {
                debug!("Order {} already {}, nothing to update", order_id, status);
                return Ok(order.clone());
            }

            order.status = status;
            order.updated_at = Utc::now();

            info!("Order {} moved from {} to {}", order_id, from, status);
            Ok(order.clone())
        })
        .await
    }

    async fn set_payment_method(&self, order_id: &str, payment_method: &str) -> StoreResult<Order> {
        bounded(self.operation_timeout, "set_payment_method", async {
            let mut state = self.state.write().await;
            let order = state.get_mut(order_id)?;

            order.payment_method = Some(payment_method.to_string());
            order.updated_at = Utc::now();

            info!("Order {} payment method set to {}", order_id, payment_method);
            Ok(order.clone())
        })
        .await
    }
}
