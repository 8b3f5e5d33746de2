use serde::{Serialize, Deserialize, Serializer};
use std::fmt;

/// Wraps client contact data so that `Debug`/`Display` never print it.
///
/// Serialization still emits the real value: persisted records and API payloads
/// need it, log macros such as `tracing::info!("{}", email)` must not.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }

    pub fn as_inner(&self) -> &T {
        &self.0
    }
}

/// Keeps the domain of an e-mail address visible for log correlation.
///
/// `"alice@example.com"` becomes `"***@example.com"`; anything without an `@`
/// is fully masked.
pub fn mask_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((_, domain)) if !domain.is_empty() => format!("***@{}", domain),
        _ => "********".to_string(),
    }
}
