//! Redemption records and their approval workflow.
//!
//! Status transitions are monotonic and one-directional:
//! `Pending -> Approved -> Delivered`, or `Pending -> Rejected`.
//! `Rejected` and `Delivered` are terminal.

use crate::account::normalize_employee_id;
use crate::error::{Result, RewardsError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Workflow state of a redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RedemptionStatus {
    /// Request submitted, awaiting an admin decision.
    Pending,
    /// Admin approved, awaiting delivery.
    Approved,
    /// Admin rejected. Terminal.
    Rejected,
    /// Product handed over. Terminal.
    Delivered,
}

/// A request to exchange points for a catalog product.
///
/// The core fields (`id`, `employee_id`, `product_id`, `points_cost`,
/// `requested_at`) are immutable; only the workflow state and its
/// stamps change, each exactly once.
#[derive(Debug, Clone, Serialize)]
pub struct Redemption {
    /// Unique redemption id, generated at request time.
    pub id: Uuid,

    /// Normalized employee id of the requester.
    pub employee_id: String,

    /// Product requested. Held by value: deleting the product from the
    /// catalog does not invalidate this record.
    pub product_id: Uuid,

    /// Points debited when the request was made.
    pub points_cost: i64,

    /// When the request was made.
    pub requested_at: DateTime<Utc>,

    /// Current workflow state.
    pub status: RedemptionStatus,

    /// Set exactly once, on entering `Approved`.
    pub approved_at: Option<DateTime<Utc>>,

    /// Set exactly once, on entering `Delivered`.
    pub delivered_at: Option<DateTime<Utc>>,

    /// Set only on rejection.
    pub rejection_reason: Option<String>,
}

impl Redemption {
    pub(crate) fn new(employee_id: &str, product_id: Uuid, points_cost: i64) -> Self {
        Redemption {
            id: Uuid::new_v4(),
            employee_id: normalize_employee_id(employee_id),
            product_id,
            points_cost,
            requested_at: Utc::now(),
            status: RedemptionStatus::Pending,
            approved_at: None,
            delivered_at: None,
            rejection_reason: None,
        }
    }

    /// `Pending -> Approved`, stamping `approved_at`.
    fn approve(&mut self) -> Result<()> {
        self.require_status(RedemptionStatus::Pending, "approved")?;
        self.status = RedemptionStatus::Approved;
        self.approved_at = Some(Utc::now());
        Ok(())
    }

    /// `Pending -> Rejected`, recording the reason.
    fn reject(&mut self, reason: &str) -> Result<()> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(RewardsError::invalid("rejection reason is required"));
        }
        self.require_status(RedemptionStatus::Pending, "rejected")?;
        self.status = RedemptionStatus::Rejected;
        self.rejection_reason = Some(reason.to_string());
        Ok(())
    }

    /// `Approved -> Delivered`, stamping `delivered_at`.
    fn mark_delivered(&mut self) -> Result<()> {
        self.require_status(RedemptionStatus::Approved, "marked delivered")?;
        self.status = RedemptionStatus::Delivered;
        self.delivered_at = Some(Utc::now());
        Ok(())
    }

    fn require_status(&self, expected: RedemptionStatus, action: &str) -> Result<()> {
        if self.status != expected {
            return Err(RewardsError::invalid_state(format!(
                "redemption {} cannot be {action} from {:?}",
                self.id, self.status
            )));
        }
        Ok(())
    }
}

/// Store of all redemptions, in request order.
#[derive(Debug, Default)]
pub struct RedemptionLog {
    redemptions: HashMap<Uuid, Redemption>,

    /// Request order, for FIFO admin listing and most-recent-first
    /// employee listing.
    order: Vec<Uuid>,
}

impl RedemptionLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, redemption: Redemption) {
        self.order.push(redemption.id);
        self.redemptions.insert(redemption.id, redemption);
    }

    /// Looks up a redemption by id.
    pub fn get(&self, redemption_id: Uuid) -> Option<&Redemption> {
        self.redemptions.get(&redemption_id)
    }

    /// Approves a pending redemption and returns the updated record.
    pub fn approve(&mut self, redemption_id: Uuid) -> Result<&Redemption> {
        let redemption = self.get_mut(redemption_id)?;
        redemption.approve()?;
        Ok(redemption)
    }

    /// Rejects a pending redemption with a non-blank reason.
    pub fn reject(&mut self, redemption_id: Uuid, reason: &str) -> Result<&Redemption> {
        let redemption = self.get_mut(redemption_id)?;
        redemption.reject(reason)?;
        Ok(redemption)
    }

    /// Marks an approved redemption as delivered.
    pub fn mark_delivered(&mut self, redemption_id: Uuid) -> Result<&Redemption> {
        let redemption = self.get_mut(redemption_id)?;
        redemption.mark_delivered()?;
        Ok(redemption)
    }

    /// All redemptions for an employee, most recent request first.
    pub fn list_by_employee(&self, employee_id: &str) -> Vec<&Redemption> {
        let employee_id = normalize_employee_id(employee_id);
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.redemptions.get(id))
            .filter(|r| r.employee_id == employee_id)
            .collect()
    }

    /// All pending redemptions, oldest request first (admin FIFO).
    pub fn list_pending(&self) -> Vec<&Redemption> {
        self.order
            .iter()
            .filter_map(|id| self.redemptions.get(id))
            .filter(|r| r.status == RedemptionStatus::Pending)
            .collect()
    }

    fn get_mut(&mut self, redemption_id: Uuid) -> Result<&mut Redemption> {
        self.redemptions
            .get_mut(&redemption_id)
            .ok_or_else(|| RewardsError::not_found("redemption", redemption_id.to_string()))
    }
}
