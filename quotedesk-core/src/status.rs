use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// Order status in the lifecycle.
///
/// Declaration order is the forward rank used by [`Lifecycle::forward_only`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Quoted,
    Accepted,
    Paid,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Quoted,
        OrderStatus::Accepted,
        OrderStatus::Paid,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Quoted => "QUOTED",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::Paid => "PAID",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| StoreError::Validation(format!("unknown order status '{}'", s)))
    }
}

/// Result of checking a requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Target equals the current status; nothing to write.
    Unchanged,
    /// The change is allowed and must be persisted.
    Apply,
}

/// Transition graph: `status -> {allowed next statuses}`.
///
/// A status with no outgoing edges is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lifecycle {
    transitions: BTreeMap<OrderStatus, BTreeSet<OrderStatus>>,
}

impl Lifecycle {
    /// PENDING → QUOTED → ACCEPTED → PAID → COMPLETED, forward skips allowed,
    /// CANCELLED reachable from every non-terminal status.
    pub fn forward_only() -> Self {
        let forward = [
            OrderStatus::Pending,
            OrderStatus::Quoted,
            OrderStatus::Accepted,
            OrderStatus::Paid,
            OrderStatus::Completed,
        ];

        let mut transitions = BTreeMap::new();
        for (rank, from) in forward.iter().enumerate() {
            let mut next: BTreeSet<OrderStatus> = forward[rank + 1..].iter().copied().collect();
            if *from != OrderStatus::Completed {
                next.insert(OrderStatus::Cancelled);
            }
            transitions.insert(*from, next);
        }
        transitions.insert(OrderStatus::Cancelled, BTreeSet::new());

        Self { transitions }
    }

    /// Builds a graph from a configuration table such as
    /// `{ "pending" = ["paid", "cancelled"], "paid" = ["completed"] }`.
    ///
    /// Statuses missing from the table are terminal.
    pub fn from_table(table: &HashMap<String, Vec<String>>) -> Result<Self, StoreError> {
        let mut transitions: BTreeMap<OrderStatus, BTreeSet<OrderStatus>> = OrderStatus::ALL
            .into_iter()
            .map(|status| (status, BTreeSet::new()))
            .collect();

        for (from, targets) in table {
            let from: OrderStatus = from.parse()?;
            let next = transitions.entry(from).or_default();
            for to in targets {
                next.insert(to.parse()?);
            }
        }

        Ok(Self { transitions })
    }

    pub fn allowed_from(&self, from: OrderStatus) -> impl Iterator<Item = OrderStatus> + '_ {
        self.transitions
            .get(&from)
            .into_iter()
            .flat_map(|next| next.iter().copied())
    }

    pub fn is_terminal(&self, status: OrderStatus) -> bool {
        self.transitions
            .get(&status)
            .map_or(true, |next| next.is_empty())
    }

    /// Validates `from -> to`. Re-applying the current status is accepted as a no-op.
    pub fn check(&self, from: OrderStatus, to: OrderStatus) -> Result<Transition, StoreError> {
        if from == to {
            return Ok(Transition::Unchanged);
        }

        let allowed = self
            .transitions
            .get(&from)
            .is_some_and(|next| next.contains(&to));

        if allowed {
            Ok(Transition::Apply)
        } else {
            Err(StoreError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::forward_only()
    }
}
