use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quotedesk_core::{NewOrder, OrderStatus, PricingRequest, StoreError, StoreResult};
use quotedesk_shared::Masked;

/// What a client hands in before a quote exists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSubmission {
    /// Client-chosen identifier. When absent one is generated.
    pub order_id: Option<String>,
    pub client_email: Masked<String>,
    pub project_type: String,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub description: String,
}

impl OrderSubmission {
    pub fn new(
        client_email: impl Into<String>,
        project_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            client_email: Masked(client_email.into()),
            project_type: project_type.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_budget(mut self, budget: impl Into<String>) -> Self {
        self.budget = Some(budget.into());
        self
    }

    pub fn with_timeline(mut self, timeline: impl Into<String>) -> Self {
        self.timeline = Some(timeline.into());
        self
    }

    /// Same required-field rule the store applies, checked before pricing runs.
    pub fn validate(&self) -> StoreResult<()> {
        let missing: Vec<&str> = [
            ("client_email", self.client_email.as_inner()),
            ("project_type", &self.project_type),
            ("description", &self.description),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Validation(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )))
        }
    }

    pub fn pricing_request(&self) -> PricingRequest {
        PricingRequest {
            project_type: self.project_type.clone(),
            budget: self.budget.clone(),
            timeline: self.timeline.clone(),
            description: self.description.clone(),
        }
    }

    pub(crate) fn to_new_order(&self, order_id: String, quote: i64) -> NewOrder {
        NewOrder {
            order_id,
            client_email: self.client_email.as_inner().trim().to_string(),
            project_type: normalize_project_type(&self.project_type),
            budget: self.budget.clone(),
            timeline: self.timeline.clone(),
            description: self.description.clone(),
            quote,
            status: OrderStatus::Pending,
            payment_method: None,
        }
    }
}

/// Eight upper-case hex characters, e.g. `3F9A1C0B`.
pub fn generate_order_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

/// `"it_solution"` → `"It Solution"`.
pub fn normalize_project_type(raw: &str) -> String {
    raw.trim()
        .replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_short_upper_hex() {
        let id = generate_order_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
        assert_ne!(generate_order_id(), generate_order_id());
    }

    #[test]
    fn test_normalize_project_type() {
        assert_eq!(normalize_project_type("it_solution"), "It Solution");
        assert_eq!(normalize_project_type("website"), "Website");
        assert_eq!(normalize_project_type("SOFTWARE"), "Software");
        assert_eq!(normalize_project_type("  consultation "), "Consultation");
    }

    #[test]
    fn test_submission_validation() {
        assert!(OrderSubmission::new("a@b.com", "website", "site").validate().is_ok());

        let err = OrderSubmission::new("", "website", " ").validate().unwrap_err();
        match err {
            StoreError::Validation(msg) => {
                assert!(msg.contains("client_email"));
                assert!(msg.contains("description"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_debug_output_hides_client_email() {
        let submission = OrderSubmission::new("secret@client.com", "website", "site");
        let debug = format!("{:?}", submission);
        assert!(!debug.contains("secret@client.com"));
        assert!(debug.contains("********"));
    }

    #[test]
    fn test_to_new_order_keeps_optional_distinction() {
        let submission = OrderSubmission::new(" a@b.com ", "it_solution", "network audit").with_budget("");
        let order = submission.to_new_order("ABCD1234".into(), 5000);

        assert_eq!(order.client_email, "a@b.com");
        assert_eq!(order.project_type, "It Solution");
        assert_eq!(order.budget.as_deref(), Some(""));
        assert_eq!(order.timeline, None);
        assert_eq!(order.quote, 5000);
    }
}
