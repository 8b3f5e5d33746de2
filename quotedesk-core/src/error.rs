/// Failure kinds surfaced by every Order Store operation.
///
/// Only `Unavailable` is transient. Everything else is a semantic outcome the
/// caller has to act on; the store never retries on its own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Order id already exists: {0}")]
    DuplicateOrderId(String),

    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: String,
        to: String,
    },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Internal storage error: {0}")]
    Internal(String),
}

impl StoreError {
    /// True when retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
