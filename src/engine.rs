//! Core rewards engine façade.
//!
//! Composes the account directory, ledger, catalog, and redemption
//! workflow behind one synchronous API, and owns the mutual-exclusion
//! discipline that keeps them consistent under concurrent callers.
//!
//! # Locking
//!
//! State is partitioned into three locks:
//!
//! - **books**: account directory + ledger. One lock, so a transaction
//!   append and its balance update form a single critical section and
//!   readers never observe one without the other.
//! - **catalog**: product records and stock counters.
//! - **redemptions**: the redemption log.
//!
//! Operations that need more than one lock acquire them in the order
//! books, catalog, redemptions. Validation runs with the locks held,
//! so check-then-act is race-free and a failed operation mutates
//! nothing.

use crate::account::{normalize_employee_id, Account, AccountDirectory};
use crate::catalog::{CatalogStore, Product};
use crate::error::{Result, RewardsError};
use crate::ledger::LedgerStore;
use crate::prize::PrizeSource;
use crate::redemption::{Redemption, RedemptionLog};
use crate::transaction::Transaction;
use log::debug;
use std::sync::RwLock;
use uuid::Uuid;

/// Account directory and ledger, mutated together under one lock.
#[derive(Debug, Default)]
struct Books {
    directory: AccountDirectory,
    ledger: LedgerStore,
}

impl Books {
    fn record_earning(
        &mut self,
        employee_id: &str,
        amount: i64,
        event_id: &str,
        description: &str,
    ) -> Result<Transaction> {
        self.ledger
            .record_earning(&mut self.directory, employee_id, amount, event_id, description)
    }

    fn record_spending(
        &mut self,
        employee_id: &str,
        amount: i64,
        redemption_id: Uuid,
        description: &str,
    ) -> Result<Transaction> {
        self.ledger.record_spending(
            &mut self.directory,
            employee_id,
            amount,
            redemption_id,
            description,
        )
    }
}

/// The rewards engine.
///
/// All methods take `&self`; share it across threads behind an `Arc`.
/// Every operation either completes or fails before returning, leaving
/// all state exactly as it was on failure.
#[derive(Debug, Default)]
pub struct RewardsEngine {
    books: RwLock<Books>,
    catalog: RwLock<CatalogStore>,
    redemptions: RwLock<RedemptionLog>,
}

impl RewardsEngine {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    // ---- accounts ----

    /// Registers a new employee account with a zero balance.
    pub fn create_account(
        &self,
        employee_id: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Account> {
        let mut books = self.books.write().expect("books lock poisoned");
        let account = books
            .directory
            .create(employee_id, email, first_name, last_name)?;
        debug!("registered account {}", account.employee_id);
        Ok(account.clone())
    }

    /// Case-insensitive account lookup by employee id.
    pub fn find_by_employee_id(&self, employee_id: &str) -> Option<Account> {
        let books = self.books.read().expect("books lock poisoned");
        books.directory.get(employee_id).cloned()
    }

    /// Case-insensitive account lookup by email.
    pub fn find_by_email(&self, email: &str) -> Option<Account> {
        let books = self.books.read().expect("books lock poisoned");
        books.directory.get_by_email(email).cloned()
    }

    /// All accounts, sorted by employee id.
    pub fn list_accounts(&self) -> Vec<Account> {
        let books = self.books.read().expect("books lock poisoned");
        books.directory.list().into_iter().cloned().collect()
    }

    /// Changes an account's email address.
    pub fn update_email(&self, employee_id: &str, new_email: &str) -> Result<()> {
        let mut books = self.books.write().expect("books lock poisoned");
        books.directory.update_email(employee_id, new_email)
    }

    /// Deactivates an account; its balance and history remain.
    pub fn deactivate_account(&self, employee_id: &str) -> Result<()> {
        let mut books = self.books.write().expect("books lock poisoned");
        books.directory.deactivate(employee_id)
    }

    /// Reactivates a previously deactivated account.
    pub fn reactivate_account(&self, employee_id: &str) -> Result<()> {
        let mut books = self.books.write().expect("books lock poisoned");
        books.directory.reactivate(employee_id)
    }

    // ---- points ----

    /// Credits points earned from an event to an active account.
    pub fn allocate_points(
        &self,
        employee_id: &str,
        points: i64,
        event_id: &str,
        description: &str,
    ) -> Result<Transaction> {
        let mut books = self.books.write().expect("books lock poisoned");
        books.record_earning(employee_id, points, event_id, description)
    }

    /// Debits points from an active account against a redemption id.
    ///
    /// This is the raw ledger entry point; it does not touch redemption
    /// state. [`RewardsEngine::request_redemption`] is the coordinated
    /// path.
    pub fn spend_points(
        &self,
        employee_id: &str,
        points: i64,
        redemption_id: Uuid,
        description: &str,
    ) -> Result<Transaction> {
        let mut books = self.books.write().expect("books lock poisoned");
        books.record_spending(employee_id, points, redemption_id, description)
    }

    /// The employee's transaction history, newest first. Empty when the
    /// account is unknown or has no transactions.
    pub fn history(&self, employee_id: &str) -> Vec<Transaction> {
        let books = self.books.read().expect("books lock poisoned");
        books
            .ledger
            .history(employee_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// The employee's current balance. `NotFound` when the account is
    /// absent.
    pub fn balance(&self, employee_id: &str) -> Result<i64> {
        let books = self.books.read().expect("books lock poisoned");
        books
            .directory
            .get(employee_id)
            .map(|a| a.balance)
            .ok_or_else(|| RewardsError::not_found("account", normalize_employee_id(employee_id)))
    }

    // ---- catalog ----

    /// Adds a product to the catalog.
    pub fn create_product(
        &self,
        name: &str,
        description: &str,
        required_points: i64,
        stock: u32,
    ) -> Result<Product> {
        let mut catalog = self.catalog.write().expect("catalog lock poisoned");
        let product = catalog.create(name, description, required_points, stock)?;
        debug!("created product {} ({})", product.name, product.id);
        Ok(product.clone())
    }

    /// Updates a product's name, description, and point price.
    pub fn update_product(
        &self,
        product_id: Uuid,
        name: &str,
        description: &str,
        required_points: i64,
    ) -> Result<()> {
        let mut catalog = self.catalog.write().expect("catalog lock poisoned");
        catalog.update(product_id, name, description, required_points)
    }

    /// Overwrites a product's stock count.
    pub fn set_stock(&self, product_id: Uuid, stock: u32) -> Result<()> {
        let mut catalog = self.catalog.write().expect("catalog lock poisoned");
        catalog.set_stock(product_id, stock)
    }

    /// Removes a product. In-flight redemptions keep their copy of its
    /// price and id.
    pub fn delete_product(&self, product_id: Uuid) -> Result<Product> {
        let mut catalog = self.catalog.write().expect("catalog lock poisoned");
        catalog.remove(product_id)
    }

    /// Looks up a product by id.
    pub fn get_product(&self, product_id: Uuid) -> Option<Product> {
        let catalog = self.catalog.read().expect("catalog lock poisoned");
        catalog.get(product_id).cloned()
    }

    /// All products, sorted by name.
    pub fn list_products(&self) -> Vec<Product> {
        let catalog = self.catalog.read().expect("catalog lock poisoned");
        catalog.list().into_iter().cloned().collect()
    }

    // ---- redemptions ----

    /// Requests a redemption: reserves one unit of stock, creates a
    /// `Pending` redemption, and records the spending transaction, as
    /// one atomic unit.
    ///
    /// Fails with `NotFound`/`InvalidState` for unknown or inactive
    /// accounts, `NotFound`/`OutOfStock` for unknown or unavailable
    /// products, and `InsufficientPoints` when the balance is short.
    /// Concurrent requests are serialized, so two callers can never
    /// both win the last unit of stock.
    pub fn request_redemption(&self, employee_id: &str, product_id: Uuid) -> Result<Redemption> {
        // Lock order: books, catalog, redemptions.
        let mut books = self.books.write().expect("books lock poisoned");
        let mut catalog = self.catalog.write().expect("catalog lock poisoned");
        let mut redemptions = self.redemptions.write().expect("redemptions lock poisoned");

        let account = books.directory.require_active(employee_id)?;
        let employee_id = account.employee_id.clone();
        let balance = account.balance;

        let product = catalog
            .get(product_id)
            .ok_or_else(|| RewardsError::not_found("product", product_id.to_string()))?;
        if !product.is_available() {
            return Err(RewardsError::OutOfStock {
                product: product.name.clone(),
            });
        }
        let cost = product.required_points;
        let product_name = product.name.clone();

        if balance < cost {
            return Err(RewardsError::InsufficientPoints {
                available: balance,
                required: cost,
            });
        }

        // All checks passed while holding every lock involved, so the
        // mutations below cannot fail and the unit stays atomic.
        let redemption = Redemption::new(&employee_id, product_id, cost);
        catalog.reserve(product_id, 1)?;
        books.record_spending(
            &employee_id,
            cost,
            redemption.id,
            &format!("Redemption of {product_name}"),
        )?;
        redemptions.insert(redemption.clone());

        debug!(
            "redemption {} pending: {} spent {} points on {}",
            redemption.id, employee_id, cost, product_name
        );
        Ok(redemption)
    }

    /// Approves a pending redemption.
    pub fn approve_redemption(&self, redemption_id: Uuid) -> Result<Redemption> {
        let mut redemptions = self.redemptions.write().expect("redemptions lock poisoned");
        redemptions.approve(redemption_id).map(Redemption::clone)
    }

    /// Rejects a pending redemption with a non-blank reason.
    ///
    /// The reserved unit is not returned to stock: the request consumed
    /// it, and operators compensate with [`RewardsEngine::set_stock`]
    /// when that is not what they want.
    pub fn reject_redemption(&self, redemption_id: Uuid, reason: &str) -> Result<Redemption> {
        let mut redemptions = self.redemptions.write().expect("redemptions lock poisoned");
        redemptions
            .reject(redemption_id, reason)
            .map(Redemption::clone)
    }

    /// Marks an approved redemption as delivered.
    pub fn mark_delivered(&self, redemption_id: Uuid) -> Result<Redemption> {
        let mut redemptions = self.redemptions.write().expect("redemptions lock poisoned");
        redemptions
            .mark_delivered(redemption_id)
            .map(Redemption::clone)
    }

    /// Looks up a redemption by id.
    pub fn get_redemption(&self, redemption_id: Uuid) -> Option<Redemption> {
        let redemptions = self.redemptions.read().expect("redemptions lock poisoned");
        redemptions.get(redemption_id).cloned()
    }

    /// The employee's redemptions, most recent request first.
    pub fn redemptions_for(&self, employee_id: &str) -> Vec<Redemption> {
        let redemptions = self.redemptions.read().expect("redemptions lock poisoned");
        redemptions
            .list_by_employee(employee_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// All pending redemptions, oldest request first.
    pub fn pending_redemptions(&self) -> Vec<Redemption> {
        let redemptions = self.redemptions.read().expect("redemptions lock poisoned");
        redemptions.list_pending().into_iter().cloned().collect()
    }

    // ---- prizes ----

    /// Credits event prizes to the winning employees, all or nothing.
    ///
    /// Each winner is `(employee id, rank)`; the point amount comes
    /// from the [`PrizeSource`] collaborator. Fails with `Invalid` when
    /// an event or rank has no prize, and with the usual account errors
    /// when a winner cannot earn — in which case nobody is credited.
    pub fn award_event_prizes(
        &self,
        source: &dyn PrizeSource,
        event_id: &str,
        winners: &[(String, u32)],
    ) -> Result<Vec<Transaction>> {
        let mut books = self.books.write().expect("books lock poisoned");

        // Resolve and validate every winner before crediting anyone.
        let mut awards = Vec::with_capacity(winners.len());
        for (employee_id, rank) in winners {
            let points = source.prize_points(event_id, *rank).ok_or_else(|| {
                RewardsError::invalid(format!("no prize at rank {rank} for event {event_id}"))
            })?;
            books.directory.require_active(employee_id)?;
            awards.push((employee_id, *rank, points));
        }

        let mut transactions = Vec::with_capacity(awards.len());
        for (employee_id, rank, points) in awards {
            let tx = books.record_earning(
                employee_id,
                points,
                event_id,
                &format!("Rank {rank} prize for event {event_id}"),
            )?;
            transactions.push(tx);
        }
        Ok(transactions)
    }
}
