use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::status::OrderStatus;

/// A client's project request together with its quote and current status.
///
/// `id`, `order_id` and `created_at` never change once the store has assigned them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: String,
    pub client_email: String,
    pub project_type: String,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub description: String,
    pub quote: i64,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input to `OrderRepository::create_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_id: String,
    pub client_email: String,
    pub project_type: String,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub description: String,
    pub quote: i64,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
}

impl NewOrder {
    /// Starts a `PENDING` order with no optional fields set.
    pub fn new(
        order_id: impl Into<String>,
        client_email: impl Into<String>,
        project_type: impl Into<String>,
        description: impl Into<String>,
        quote: i64,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            client_email: client_email.into(),
            project_type: project_type.into(),
            budget: None,
            timeline: None,
            description: description.into(),
            quote,
            status: OrderStatus::Pending,
            payment_method: None,
        }
    }

    pub fn with_budget(mut self, budget: impl Into<String>) -> Self {
        self.budget = Some(budget.into());
        self
    }

    pub fn with_timeline(mut self, timeline: impl Into<String>) -> Self {
        self.timeline = Some(timeline.into());
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_payment_method(mut self, payment_method: impl Into<String>) -> Self {
        self.payment_method = Some(payment_method.into());
        self
    }

    /// Rejects blank required fields and negative quotes.
    ///
    /// Optional fields are stored as given, so `Some("")` stays distinct from `None`.
    pub fn validate(&self) -> Result<(), StoreError> {
        let required = [
            ("order_id", &self.order_id),
            ("client_email", &self.client_email),
            ("project_type", &self.project_type),
            ("description", &self.description),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(StoreError::Validation(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        }

        if self.quote < 0 {
            return Err(StoreError::Validation(format!(
                "quote must be non-negative, got {}",
                self.quote
            )));
        }

        Ok(())
    }

    /// Materializes the record once the store has assigned its identity and timestamp.
    pub fn into_order(self, id: i64, created_at: DateTime<Utc>) -> Order {
        Order {
            id,
            order_id: self.order_id,
            client_email: self.client_email,
            project_type: self.project_type,
            budget: self.budget,
            timeline: self.timeline,
            description: self.description,
            quote: self.quote,
            status: self.status,
            payment_method: self.payment_method,
            created_at,
            updated_at: created_at,
        }
    }
}

/// Exact-match filters for `OrderRepository::list_orders`. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub client_email: Option<String>,
    pub limit: Option<usize>,
}

impl OrderFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn by_client_email(client_email: impl Into<String>) -> Self {
        Self {
            client_email: Some(client_email.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, order: &Order) -> bool {
        let status_ok = self.status.map_or(true, |s| order.status == s);
        let email_ok = self
            .client_email
            .as_deref()
            .map_or(true, |email| order.client_email == email);
        status_ok && email_ok
    }
}
