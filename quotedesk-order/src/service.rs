use std::sync::Arc;
use tracing::{error, info, warn};

use quotedesk_core::{
    Order, OrderFilter, OrderRepository, OrderStatus, QuotePricer, StoreError, StoreResult,
};
use quotedesk_shared::pii::mask_email;
use quotedesk_store::app_config::SubmissionConfig;

use crate::submission::{generate_order_id, OrderSubmission};

type IdGenerator = Box<dyn Fn() -> String + Send + Sync>;

/// Drives order submission, quoting and payment against any Order Store backend.
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    pricer: Arc<dyn QuotePricer>,
    max_id_attempts: u32,
    next_order_id: IdGenerator,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>, pricer: Arc<dyn QuotePricer>) -> Self {
        Self::from_config(repo, pricer, &SubmissionConfig::default())
    }

    pub fn from_config(
        repo: Arc<dyn OrderRepository>,
        pricer: Arc<dyn QuotePricer>,
        config: &SubmissionConfig,
    ) -> Self {
        Self {
            repo,
            pricer,
            max_id_attempts: config.max_id_attempts.max(1),
            next_order_id: Box::new(generate_order_id),
        }
    }

    pub fn with_id_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.next_order_id = Box::new(generator);
        self
    }

    pub fn repository(&self) -> &Arc<dyn OrderRepository> {
        &self.repo
    }

    /// Prices a submission and stores it as a `PENDING` order.
    ///
    /// A collision on a generated `order_id` draws a fresh one, up to
    /// `max_id_attempts` times. A collision on a client-supplied id is returned
    /// as-is so the caller can treat it as an idempotent resubmission.
    pub async fn submit(&self, submission: OrderSubmission) -> StoreResult<Order> {
        submission.validate()?;

        let quote = self.pricer.quote(&submission.pricing_request())?;

        if let Some(order_id) = submission.order_id.clone() {
            return self.repo.create_order(submission.to_new_order(order_id, quote)).await;
        }

        let mut attempt = 1;
        loop {
            let order_id = (self.next_order_id)();
            match self.repo.create_order(submission.to_new_order(order_id.clone(), quote)).await {
                Err(StoreError::DuplicateOrderId(_)) if attempt < self.max_id_attempts => {
                    warn!(
                        "Generated order id {} already taken (attempt {}/{}), drawing another",
                        order_id, attempt, self.max_id_attempts
                    );
                    attempt += 1;
                }
                Ok(order) => {
                    info!(
                        "Submission from {} stored as order {} with quote {}",
                        mask_email(&order.client_email),
                        order.order_id,
                        order.quote
                    );
                    return Ok(order);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Payment processor callback: marks the order `PAID`, then records how it was paid.
    ///
    /// The status change goes first so a rejected transition writes nothing.
    pub async fn confirm_payment(&self, order_id: &str, payment_method: &str) -> StoreResult<Order> {
        if payment_method.trim().is_empty() {
            return Err(StoreError::Validation("payment_method must not be empty".into()));
        }

        self.repo.update_order_status(order_id, OrderStatus::Paid).await?;

        match self.repo.set_payment_method(order_id, payment_method).await {
            Ok(order) => {
                info!("Order {} confirmed as paid via {}", order_id, payment_method);
                Ok(order)
            }
            Err(e) => {
                error!("Order {} is PAID but recording payment method failed: {}", order_id, e);
                Err(e)
            }
        }
    }

    /// Applies a status given by name, e.g. from an admin tool or webhook payload.
    pub async fn update_status(&self, order_id: &str, status: &str) -> StoreResult<Order> {
        let status: OrderStatus = status.parse()?;
        self.repo.update_order_status(order_id, status).await
    }

    pub async fn mark_quoted(&self, order_id: &str) -> StoreResult<Order> {
        self.repo.update_order_status(order_id, OrderStatus::Quoted).await
    }

    pub async fn accept(&self, order_id: &str) -> StoreResult<Order> {
        self.repo.update_order_status(order_id, OrderStatus::Accepted).await
    }

    pub async fn complete(&self, order_id: &str) -> StoreResult<Order> {
        self.repo.update_order_status(order_id, OrderStatus::Completed).await
    }

    pub async fn cancel(&self, order_id: &str) -> StoreResult<Order> {
        self.repo.update_order_status(order_id, OrderStatus::Cancelled).await
    }

    pub async fn set_payment_method(&self, order_id: &str, payment_method: &str) -> StoreResult<Order> {
        self.repo.set_payment_method(order_id, payment_method).await
    }

    pub async fn get(&self, order_id: &str) -> StoreResult<Order> {
        self.repo.get_order(order_id).await
    }

    pub async fn get_by_id(&self, id: i64) -> StoreResult<Order> {
        self.repo.get_order_by_id(id).await
    }

    pub async fn list(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        self.repo.list_orders(filter).await
    }

    pub async fn orders_for_client(&self, client_email: &str) -> StoreResult<Vec<Order>> {
        self.repo.list_orders(&OrderFilter::by_client_email(client_email)).await
    }
}
