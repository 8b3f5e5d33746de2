use std::future::Future;
use std::time::Duration;

use quotedesk_core::{StoreError, StoreResult};

/// Runs a store operation under a deadline; expiry is reported as a transient failure.
pub(crate) async fn bounded<T, F>(limit: Duration, operation: &'static str, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("Order store operation {} timed out after {:?}", operation, limit);
            Err(StoreError::Unavailable(format!(
                "{} timed out after {}ms",
                operation,
                limit.as_millis()
            )))
        }
    }
}
