//! # Rewards Engine
//!
//! An in-memory employee rewards engine: a points ledger, a product
//! catalog, and a redemption approval workflow composed behind one
//! synchronous, thread-safe façade.
//!
//! ## Design Principles
//!
//! - **Conservation of points**: an account balance always equals the
//!   signed sum of its ledger transactions
//! - **No oversell, no double-spend**: balance and stock mutations are
//!   serialized per store, with a fixed lock acquisition order
//! - **All-or-nothing operations**: a failure leaves every touched
//!   entity exactly as it was
//! - **Monotonic workflow**: redemption statuses only move forward
//!
//! ## Example
//!
//! ```no_run
//! use rewards_engine::RewardsEngine;
//!
//! let engine = RewardsEngine::new();
//! engine.create_account("EMP001", "alice@example.com", "Alice", "Smith").unwrap();
//! engine.allocate_points("EMP001", 600, "EVT001", "Hackathon winner").unwrap();
//! let product = engine.create_product("Gift Card", "A 50-dollar gift card", 500, 1).unwrap();
//! let redemption = engine.request_redemption("EMP001", product.id).unwrap();
//! engine.approve_redemption(redemption.id).unwrap();
//! ```

pub mod account;
pub mod batch;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod prize;
pub mod redemption;
pub mod transaction;

pub use account::Account;
pub use batch::{BatchRunner, Operation, OperationRecord};
pub use catalog::Product;
pub use engine::RewardsEngine;
pub use error::{Result, RewardsError};
pub use prize::{PrizeSource, PrizeTable, PrizeTier};
pub use redemption::{Redemption, RedemptionStatus};
pub use transaction::{Transaction, TxSource};
