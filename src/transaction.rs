//! Ledger transaction records.
//!
//! A transaction is created once and never mutated or deleted. Earnings
//! carry a positive amount and reference the event that produced them;
//! spendings carry a negative amount and reference the redemption that
//! consumed them.

use crate::account::normalize_employee_id;
use crate::error::{Result, RewardsError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// What produced a transaction, with the variant-specific reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TxSource {
    /// Points earned from an event.
    Earning {
        /// Identifier of the event that awarded the points.
        event_id: String,
    },

    /// Points spent on a redemption.
    Spending {
        /// Identifier of the redemption the points paid for.
        redemption_id: Uuid,
    },
}

/// An immutable, signed entry in the points ledger.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    /// Unique transaction id, assigned at creation.
    pub id: Uuid,

    /// Normalized employee id the entry belongs to.
    pub employee_id: String,

    /// Signed point amount: positive for earnings, negative for spendings.
    /// Never zero.
    pub amount: i64,

    /// Origin of the entry and its reference.
    pub source: TxSource,

    /// Human-readable description.
    pub description: String,

    /// When the entry was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl Transaction {
    /// Builds an earning entry (amount > 0) referencing an event.
    pub fn earning(
        employee_id: &str,
        amount: i64,
        event_id: &str,
        description: &str,
    ) -> Result<Self> {
        let event_id = event_id.trim();
        if event_id.is_empty() {
            return Err(RewardsError::invalid("event id is required for an earning"));
        }
        Self::build(
            employee_id,
            amount,
            TxSource::Earning {
                event_id: event_id.to_string(),
            },
            description,
        )
    }

    /// Builds a spending entry referencing a redemption. The given
    /// `amount` is the positive number of points spent; the stored
    /// amount is its negation.
    pub fn spending(
        employee_id: &str,
        amount: i64,
        redemption_id: Uuid,
        description: &str,
    ) -> Result<Self> {
        Self::build(
            employee_id,
            amount,
            TxSource::Spending { redemption_id },
            description,
        )
        .map(|mut tx| {
            tx.amount = -tx.amount;
            tx
        })
    }

    fn build(employee_id: &str, amount: i64, source: TxSource, description: &str) -> Result<Self> {
        let employee_id = normalize_employee_id(employee_id);
        if employee_id.is_empty() {
            return Err(RewardsError::invalid("employee id is required"));
        }
        if amount <= 0 {
            return Err(RewardsError::invalid(format!(
                "point amount must be positive, got {amount}"
            )));
        }
        let description = description.trim();
        if description.is_empty() {
            return Err(RewardsError::invalid("transaction description is required"));
        }

        Ok(Transaction {
            id: Uuid::new_v4(),
            employee_id,
            amount,
            source,
            description: description.to_string(),
            recorded_at: Utc::now(),
        })
    }

    /// Returns `true` for earning entries.
    pub fn is_earning(&self) -> bool {
        matches!(self.source, TxSource::Earning { .. })
    }
}
