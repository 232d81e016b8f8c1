//! Append-only points ledger.
//!
//! Every write pairs a transaction append with the matching balance
//! update on the account directory, in the same call. The stored
//! account balance is the authoritative value on the hot path; the
//! ledger exists for audit and history queries and is never rescanned
//! to derive a balance.

use crate::account::{normalize_employee_id, AccountDirectory};
use crate::error::Result;
use crate::transaction::Transaction;
use log::debug;
use uuid::Uuid;

/// The append-only collection of ledger transactions.
///
/// Entries are held in recording order. All writes go through a single
/// exclusive critical section (see [`crate::engine::RewardsEngine`]),
/// so vector order is chronological and serves as the tie-breaker for
/// equal timestamps.
#[derive(Debug, Default)]
pub struct LedgerStore {
    transactions: Vec<Transaction>,
}

impl LedgerStore {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an earning and credits the account in one step.
    ///
    /// The employee must resolve to an active account. Nothing is
    /// appended if validation or the balance update fails.
    pub fn record_earning(
        &mut self,
        directory: &mut AccountDirectory,
        employee_id: &str,
        amount: i64,
        event_id: &str,
        description: &str,
    ) -> Result<Transaction> {
        directory.require_active(employee_id)?;
        let tx = Transaction::earning(employee_id, amount, event_id, description)?;

        directory.adjust_balance(&tx.employee_id, amount)?;
        debug!(
            "credited {} points to {} for event {}",
            amount, tx.employee_id, event_id
        );
        self.transactions.push(tx.clone());
        Ok(tx)
    }

    /// Records a spending and debits the account in one step.
    ///
    /// `amount` is the positive number of points spent; the entry is
    /// stored negative. The employee must resolve to an active account
    /// with balance >= amount, otherwise `InsufficientPoints`.
    pub fn record_spending(
        &mut self,
        directory: &mut AccountDirectory,
        employee_id: &str,
        amount: i64,
        redemption_id: Uuid,
        description: &str,
    ) -> Result<Transaction> {
        directory.require_active(employee_id)?;
        let tx = Transaction::spending(employee_id, amount, redemption_id, description)?;

        directory.adjust_balance(&tx.employee_id, -amount)?;
        debug!(
            "debited {} points from {} for redemption {}",
            amount, tx.employee_id, redemption_id
        );
        self.transactions.push(tx.clone());
        Ok(tx)
    }

    /// Returns the employee's transactions, newest first.
    ///
    /// Unknown employees and employees with no transactions both yield
    /// an empty sequence.
    pub fn history(&self, employee_id: &str) -> Vec<&Transaction> {
        let employee_id = normalize_employee_id(employee_id);
        self.transactions
            .iter()
            .rev()
            .filter(|tx| tx.employee_id == employee_id)
            .collect()
    }

    /// Total number of entries across all employees.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Returns `true` if no entry has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Signed sum of the employee's entries. Audit-only: operational
    /// code reads the account balance instead.
    #[cfg(test)]
    pub fn audit_sum(&self, employee_id: &str) -> i64 {
        let employee_id = normalize_employee_id(employee_id);
        self.transactions
            .iter()
            .filter(|tx| tx.employee_id == employee_id)
            .map(|tx| tx.amount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RewardsError;

    fn books() -> (AccountDirectory, LedgerStore) {
        let mut directory = AccountDirectory::new();
        directory
            .create("EMP001", "alice@example.com", "Alice", "Smith")
            .unwrap();
        (directory, LedgerStore::new())
    }

    #[test]
    fn test_earning_updates_balance_and_ledger() {
        let (mut directory, mut ledger) = books();

        let tx = ledger
            .record_earning(&mut directory, "emp001", 600, "EVT001", "Hackathon winner")
            .unwrap();

        assert_eq!(tx.amount, 600);
        assert_eq!(directory.get("EMP001").unwrap().balance, 600);
        assert_eq!(ledger.audit_sum("EMP001"), 600);
    }

    #[test]
    fn test_spending_requires_sufficient_balance() {
        let (mut directory, mut ledger) = books();
        ledger
            .record_earning(&mut directory, "EMP001", 100, "EVT001", "Earned")
            .unwrap();

        let err = ledger
            .record_spending(&mut directory, "EMP001", 500, Uuid::new_v4(), "Gift card")
            .unwrap_err();
        assert!(matches!(err, RewardsError::InsufficientPoints { .. }));

        // Nothing was written for the failed spend.
        assert_eq!(directory.get("EMP001").unwrap().balance, 100);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_spending_debits_exact_amount() {
        let (mut directory, mut ledger) = books();
        ledger
            .record_earning(&mut directory, "EMP001", 600, "EVT001", "Earned")
            .unwrap();
        ledger
            .record_spending(&mut directory, "EMP001", 500, Uuid::new_v4(), "Gift card")
            .unwrap();

        assert_eq!(directory.get("EMP001").unwrap().balance, 100);
        assert_eq!(ledger.audit_sum("EMP001"), 100);
    }

    #[test]
    fn test_unknown_employee_is_not_found() {
        let (mut directory, mut ledger) = books();
        let err = ledger
            .record_earning(&mut directory, "EMP404", 10, "EVT001", "Earned")
            .unwrap_err();
        assert!(matches!(err, RewardsError::NotFound { .. }));
    }

    #[test]
    fn test_inactive_employee_cannot_earn_or_spend() {
        let (mut directory, mut ledger) = books();
        directory.deactivate("EMP001").unwrap();

        let err = ledger
            .record_earning(&mut directory, "EMP001", 10, "EVT001", "Earned")
            .unwrap_err();
        assert!(matches!(err, RewardsError::InvalidState { .. }));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_history_newest_first_with_stable_ties() {
        let (mut directory, mut ledger) = books();
        for n in 1..=3 {
            ledger
                .record_earning(
                    &mut directory,
                    "EMP001",
                    n * 10,
                    "EVT001",
                    &format!("Earning {n}"),
                )
                .unwrap();
        }

        let history = ledger.history("emp001");
        let amounts: Vec<_> = history.iter().map(|tx| tx.amount).collect();
        assert_eq!(amounts, vec![30, 20, 10]);
    }

    #[test]
    fn test_history_for_unknown_employee_is_empty() {
        let (_, ledger) = books();
        assert!(ledger.history("EMP404").is_empty());
    }
}
