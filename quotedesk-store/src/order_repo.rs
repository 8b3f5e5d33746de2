use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{debug, info};

use quotedesk_core::{
    Lifecycle, NewOrder, Order, OrderFilter, OrderRepository, OrderStatus, StoreError, StoreResult,
    Transition,
};
use quotedesk_shared::pii::mask_email;

use crate::timeout::bounded;

const ORDER_COLUMNS: &str = "id, order_id, client_email, project_type, budget, timeline, \
    description, quote, status, payment_method, created_at, updated_at";

/// Postgres-backed Order Store.
///
/// `id` comes from the identity column and `order_id` uniqueness from the
/// `orders_order_id_key` constraint, so concurrent inserts race inside Postgres.
pub struct PgOrderRepository {
    pool: PgPool,
    lifecycle: Lifecycle,
    operation_timeout: Duration,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool, lifecycle: Lifecycle, operation_timeout: Duration) -> Self {
        Self {
            pool,
            lifecycle,
            operation_timeout,
        }
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    async fn fetch_by_order_id(&self, order_id: &str) -> StoreResult<Order> {
        let sql = format!("SELECT {} FROM orders WHERE order_id = $1", ORDER_COLUMNS);
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.ok_or_else(|| StoreError::NotFound(order_id.to_string()))?
            .try_into()
    }

    async fn transition(&self, order_id: &str, status: OrderStatus) -> StoreResult<Order> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // Row lock serializes concurrent transitions on the same order
        let sql = format!("SELECT {} FROM orders WHERE order_id = $1 FOR UPDATE", ORDER_COLUMNS);
        let current: Order = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| StoreError::NotFound(order_id.to_string()))?
            .try_into()?;

        if self.lifecycle.check(current.status, status)? == Transition::Unchanged {
            tx.rollback().await.map_err(map_sqlx_error)?;
            debug!("Order {} already {}, nothing to update", order_id, status);
            return Ok(current);
        }

        let sql = format!(
            "UPDATE orders SET status = $1, updated_at = clock_timestamp() WHERE id = $2 RETURNING {}",
            ORDER_COLUMNS
        );
        let updated: Order = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(status.as_str())
            .bind(current.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .try_into()?;

        tx.commit().await.map_err(map_sqlx_error)?;

        info!("Order {} moved from {} to {}", order_id, current.status, updated.status);
        Ok(updated)
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    order_id: String,
    client_email: String,
    project_type: String,
    budget: Option<String>,
    timeline: Option<String>,
    description: String,
    quote: i64,
    status: String,
    payment_method: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row.status.parse().map_err(|_| {
            StoreError::Internal(format!(
                "order {} has unknown status '{}' in storage",
                row.order_id, row.status
            ))
        })?;

        Ok(Order {
            id: row.id,
            order_id: row.order_id,
            client_email: row.client_email,
            project_type: row.project_type,
            budget: row.budget,
            timeline: row.timeline,
            description: row.description,
            quote: row.quote,
            status,
            payment_method: row.payment_method,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Maps sqlx failures onto the store's error kinds.
///
/// Unique violations are handled at the insert site, where the offending `order_id` is known.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_check_violation() => {
            StoreError::Validation(db.message().to_string())
        }
        // serialization_failure / deadlock_detected
        sqlx::Error::Database(db) if matches!(db.code().as_deref(), Some("40001") | Some("40P01")) => {
            StoreError::Unavailable(db.message().to_string())
        }
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Internal(err.to_string()),
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create_order(&self, order: NewOrder) -> StoreResult<Order> {
        order.validate()?;

        bounded(self.operation_timeout, "create_order", async {
            let sql = format!(
                r#"
                INSERT INTO orders (order_id, client_email, project_type, budget, timeline, description, quote, status, payment_method)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING {}
                "#,
                ORDER_COLUMNS
            );

            let row = sqlx::query_as::<_, OrderRow>(&sql)
                .bind(&order.order_id)
                .bind(&order.client_email)
                .bind(&order.project_type)
                .bind(&order.budget)
                .bind(&order.timeline)
                .bind(&order.description)
                .bind(order.quote)
                .bind(order.status.as_str())
                .bind(&order.payment_method)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| match &e {
                    sqlx::Error::Database(db) if db.is_unique_violation() => {
                        StoreError::DuplicateOrderId(order.order_id.clone())
                    }
                    _ => map_sqlx_error(e),
                })?;

            let created: Order = row.try_into()?;
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
        bounded(self.operation_timeout, "get_order", self.fetch_by_order_id(order_id)).await
    }

    async fn get_order_by_id(&self, id: i64) -> StoreResult<Order> {
        bounded(self.operation_timeout, "get_order_by_id", async {
            let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
            let row = sqlx::query_as::<_, OrderRow>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

            row.ok_or_else(|| StoreError::NotFound(format!("id {}", id)))?
                .try_into()
        })
        .await
    }

    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        bounded(self.operation_timeout, "list_orders", async {
            let mut qb: QueryBuilder<Postgres> =
                QueryBuilder::new(format!("SELECT {} FROM orders WHERE TRUE", ORDER_COLUMNS));

            if let Some(status) = filter.status {
                qb.push(" AND status = ").push_bind(status.as_str());
            }
            if let Some(email) = &filter.client_email {
                qb.push(" AND client_email = ").push_bind(email.clone());
            }
            qb.push(" ORDER BY created_at ASC, id ASC");
            if let Some(limit) = filter.limit {
                qb.push(" LIMIT ").push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
            }

            let rows = qb
                .build_query_as::<OrderRow>()
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

            rows.into_iter().map(Order::try_from).collect()
        })
        .await
    }

    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> StoreResult<Order> {
        bounded(self.operation_timeout, "update_order_status", self.transition(order_id, status)).await
    }

    async fn set_payment_method(&self, order_id: &str, payment_method: &str) -> StoreResult<Order> {
        bounded(self.operation_timeout, "set_payment_method", async {
            let sql = format!(
                "UPDATE orders SET payment_method = $1, updated_at = clock_timestamp() WHERE order_id = $2 RETURNING {}",
                ORDER_COLUMNS
            );
            let row = sqlx::query_as::<_, OrderRow>(&sql)
                .bind(payment_method)
                .bind(order_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

            let updated: Order = row
                .ok_or_else(|| StoreError::NotFound(order_id.to_string()))?
                .try_into()?;
            info!("Order {} payment method set to {}", order_id, payment_method);
            Ok(updated)
        })
        .await
    }
}
