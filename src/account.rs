//! Employee account model and the account directory.
//!
//! Maintains the invariant: `balance` equals the signed sum of the
//! employee's ledger transactions, and never goes negative.

use crate::error::{Result, RewardsError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Normalizes an employee id for storage and lookup (trimmed, uppercase).
pub fn normalize_employee_id(employee_id: &str) -> String {
    employee_id.trim().to_uppercase()
}

/// Normalizes an email address for storage and lookup (trimmed, lowercase).
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Represents an employee's rewards account.
///
/// # Invariants
///
/// - `employee_id` and `email` are stored in normalized form and compared
///   normalized only
/// - `balance >= 0` after every operation
/// - Accounts are never removed, only deactivated
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    /// Unique employee identifier, normalized to uppercase. Immutable.
    pub employee_id: String,

    /// Unique email address, normalized to lowercase. Mutable.
    pub email: String,

    /// Employee first name.
    pub first_name: String,

    /// Employee last name.
    pub last_name: String,

    /// Whether the account may earn or spend points.
    pub active: bool,

    /// Current points balance. Mirrors the ledger sum at all times.
    pub balance: i64,

    /// When the account was registered.
    pub created_at: DateTime<Utc>,
}

impl Account {
    fn new(employee_id: String, email: String, first_name: String, last_name: String) -> Self {
        Account {
            employee_id,
            email,
            first_name,
            last_name,
            active: true,
            balance: 0,
            created_at: Utc::now(),
        }
    }
}

/// Directory of employee accounts, the single source of truth for
/// balances and eligibility.
///
/// Lookups are case-insensitive: both keys of the primary map and the
/// email index hold normalized strings, so normalization happens once
/// at the boundary.
#[derive(Debug, Default)]
pub struct AccountDirectory {
    /// Accounts indexed by normalized employee id.
    accounts: HashMap<String, Account>,

    /// Normalized email -> normalized employee id.
    email_index: HashMap<String, String>,
}

impl AccountDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new account.
    ///
    /// Fails with `Conflict` if the employee id or email is already
    /// taken (case-insensitive), and with `Invalid` if any field is
    /// blank or the email has no `@`.
    pub fn create(
        &mut self,
        employee_id: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<&Account> {
        let employee_id = normalize_employee_id(employee_id);
        let email = normalize_email(email);

        if employee_id.is_empty() {
            return Err(RewardsError::invalid("employee id is required"));
        }
        validate_email(&email)?;
        let first_name = require_field(first_name, "first name")?;
        let last_name = require_field(last_name, "last name")?;

        if self.accounts.contains_key(&employee_id) {
            return Err(RewardsError::conflict(format!(
                "employee id {employee_id} already exists"
            )));
        }
        if self.email_index.contains_key(&email) {
            return Err(RewardsError::conflict(format!(
                "email {email} already in use"
            )));
        }

        self.email_index
            .insert(email.clone(), employee_id.clone());
        let account = Account::new(employee_id.clone(), email, first_name, last_name);
        Ok(self.accounts.entry(employee_id).or_insert(account))
    }

    /// Looks up an account by employee id, case-insensitively.
    pub fn get(&self, employee_id: &str) -> Option<&Account> {
        self.accounts.get(&normalize_employee_id(employee_id))
    }

    /// Looks up an account by email, case-insensitively.
    pub fn get_by_email(&self, email: &str) -> Option<&Account> {
        self.email_index
            .get(&normalize_email(email))
            .and_then(|id| self.accounts.get(id))
    }

    /// Returns all accounts, sorted by employee id for deterministic output.
    pub fn list(&self) -> Vec<&Account> {
        let mut accounts: Vec<_> = self.accounts.values().collect();
        accounts.sort_by(|a, b| a.employee_id.cmp(&b.employee_id));
        accounts
    }

    /// Changes an account's email address.
    ///
    /// Fails with `Conflict` if the new email belongs to a different
    /// account, and with `Invalid` if it is malformed. Re-assigning an
    /// account its own email is a no-op.
    pub fn update_email(&mut self, employee_id: &str, new_email: &str) -> Result<()> {
        let employee_id = normalize_employee_id(employee_id);
        let new_email = normalize_email(new_email);
        validate_email(&new_email)?;

        let account = self
            .accounts
            .get_mut(&employee_id)
            .ok_or_else(|| RewardsError::not_found("account", employee_id.clone()))?;

        if let Some(owner) = self.email_index.get(&new_email) {
            if *owner != employee_id {
                return Err(RewardsError::conflict(format!(
                    "email {new_email} already in use"
                )));
            }
            return Ok(());
        }

        self.email_index.remove(&account.email);
        self.email_index.insert(new_email.clone(), employee_id);
        account.email = new_email;
        Ok(())
    }

    /// Deactivates an account. Fails with `InvalidState` if already inactive.
    pub fn deactivate(&mut self, employee_id: &str) -> Result<()> {
        let account = self.get_mut(employee_id)?;
        if !account.active {
            return Err(RewardsError::invalid_state(format!(
                "account {} is already inactive",
                account.employee_id
            )));
        }
        account.active = false;
        Ok(())
    }

    /// Reactivates an account. Fails with `InvalidState` if already active.
    pub fn reactivate(&mut self, employee_id: &str) -> Result<()> {
        let account = self.get_mut(employee_id)?;
        if account.active {
            return Err(RewardsError::invalid_state(format!(
                "account {} is already active",
                account.employee_id
            )));
        }
        account.active = true;
        Ok(())
    }

    /// Applies a signed balance change.
    ///
    /// Internal entry point used by the ledger: every call pairs with a
    /// transaction append in the same critical section. Fails with
    /// `Invalid` on a zero delta and `InsufficientPoints` if the balance
    /// would go negative; the balance is untouched on failure.
    pub(crate) fn adjust_balance(&mut self, employee_id: &str, delta: i64) -> Result<()> {
        if delta == 0 {
            return Err(RewardsError::invalid("balance delta cannot be zero"));
        }

        let account = self.get_mut(employee_id)?;
        let next = account.balance + delta;
        if next < 0 {
            return Err(RewardsError::InsufficientPoints {
                available: account.balance,
                required: -delta,
            });
        }
        account.balance = next;
        Ok(())
    }

    /// Resolves an account that must exist and be active, as required by
    /// every balance-mutating operation.
    pub(crate) fn require_active(&self, employee_id: &str) -> Result<&Account> {
        let account = self
            .get(employee_id)
            .ok_or_else(|| RewardsError::not_found("account", normalize_employee_id(employee_id)))?;
        if !account.active {
            return Err(RewardsError::invalid_state(format!(
                "account {} is inactive",
                account.employee_id
            )));
        }
        Ok(account)
    }

    fn get_mut(&mut self, employee_id: &str) -> Result<&mut Account> {
        let employee_id = normalize_employee_id(employee_id);
        self.accounts
            .get_mut(&employee_id)
            .ok_or_else(|| RewardsError::not_found("account", employee_id))
    }
}

/// Rejects emails without an `@` or with nothing around it worth keeping.
fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(RewardsError::invalid("email is required"));
    }
    if !email.contains('@') {
        return Err(RewardsError::invalid(format!(
            "email {email} is missing an @"
        )));
    }
    Ok(())
}

fn require_field(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RewardsError::invalid(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
