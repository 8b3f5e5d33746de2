use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Inputs a pricing function sees when quoting a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingRequest {
    pub project_type: String,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub description: String,
}

/// External pricing function. The store records the value, it never computes it.
pub trait QuotePricer: Send + Sync {
    fn quote(&self, request: &PricingRequest) -> StoreResult<i64>;
}

/// Pricer returning a pre-agreed amount regardless of the request.
#[derive(Debug, Clone, Copy)]
pub struct FixedQuote(pub i64);

impl QuotePricer for FixedQuote {
    fn quote(&self, _request: &PricingRequest) -> StoreResult<i64> {
        if self.0 < 0 {
            return Err(StoreError::Validation(format!(
                "quote must be non-negative, got {}",
                self.0
            )));
        }
        Ok(self.0)
    }
}

impl<F> QuotePricer for F
where
    F: Fn(&PricingRequest) -> StoreResult<i64> + Send + Sync,
{
    fn quote(&self, request: &PricingRequest) -> StoreResult<i64> {
        self(request)
    }
}
