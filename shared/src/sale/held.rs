//! Held (parked) transactions

use serde::{Deserialize, Serialize};

use super::{CartLine, CheckoutMetadata};
use crate::types::Timestamp;

/// A parked cart together with its checkout form snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeldTransaction {
    /// Snowflake id (see [`crate::util::snowflake_id`])
    pub id: i64,
    pub lines: Vec<CartLine>,
    pub metadata: CheckoutMetadata,
    pub created_at: Timestamp,
}

impl HeldTransaction {
    pub fn new(id: i64, lines: Vec<CartLine>, metadata: CheckoutMetadata, created_at: Timestamp) -> Self {
        Self {
            id,
            lines,
            metadata,
            created_at,
        }
    }

    /// Total units across all lines
    pub fn item_count(&self) -> i32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}
