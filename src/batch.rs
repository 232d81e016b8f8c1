//! CSV batch front-end.
//!
//! A hosting layer over [`RewardsEngine`]: reads operation rows one at
//! a time, applies them, and writes the final account states. Rows that
//! fail to parse or apply are logged at `warn` and skipped, so one bad
//! row never aborts a batch.
//!
//! Product and redemption ids are generated by the engine, so rows
//! refer to them through caller-supplied **tags**: a `product` row
//! names a tag that later `redeem` rows use, and a `redeem` row names a
//! tag that later `approve`/`reject`/`deliver` rows use.

use crate::engine::RewardsEngine;
use crate::error::Result;
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::{Read, Write};
use uuid::Uuid;

/// Raw operation row as read from CSV. Columns besides `op` are
/// optional; each operation reads the ones it needs.
#[derive(Debug, Deserialize)]
pub struct OperationRecord {
    /// Operation name: register, deactivate, reactivate, allocate,
    /// product, restock, redeem, approve, reject, deliver
    pub op: String,

    /// Caller-supplied tag naming a product or redemption
    pub tag: Option<String>,

    /// Employee id
    pub employee: Option<String>,

    /// Email address (register)
    pub email: Option<String>,

    /// First name (register)
    pub first_name: Option<String>,

    /// Last name (register)
    pub last_name: Option<String>,

    /// Product name (product)
    pub name: Option<String>,

    /// Product or transaction description
    pub description: Option<String>,

    /// Point amount (allocate, product)
    pub points: Option<i64>,

    /// Stock count (product, restock)
    pub stock: Option<u32>,

    /// Event id (allocate)
    pub event: Option<String>,

    /// Product tag being redeemed (redeem)
    pub product: Option<String>,

    /// Rejection reason (reject)
    pub reason: Option<String>,
}

impl OperationRecord {
    /// Parses the raw row into a typed operation.
    ///
    /// Returns `None` if the operation name is unknown or a required
    /// column is missing.
    pub fn parse(&self) -> Option<Operation> {
        match self.op.trim().to_lowercase().as_str() {
            "register" => Some(Operation::Register {
                employee: self.employee.clone()?,
                email: self.email.clone()?,
                first_name: self.first_name.clone()?,
                last_name: self.last_name.clone()?,
            }),
            "deactivate" => Some(Operation::Deactivate {
                employee: self.employee.clone()?,
            }),
            "reactivate" => Some(Operation::Reactivate {
                employee: self.employee.clone()?,
            }),
            "allocate" => Some(Operation::Allocate {
                employee: self.employee.clone()?,
                points: self.points?,
                event: self.event.clone()?,
                description: self.description.clone()?,
            }),
            "product" => Some(Operation::Product {
                tag: self.tag.clone()?,
                name: self.name.clone()?,
                description: self.description.clone()?,
                points: self.points?,
                stock: self.stock?,
            }),
            "restock" => Some(Operation::Restock {
                tag: self.tag.clone()?,
                stock: self.stock?,
            }),
            "redeem" => Some(Operation::Redeem {
                tag: self.tag.clone()?,
                employee: self.employee.clone()?,
                product: self.product.clone()?,
            }),
            "approve" => Some(Operation::Approve {
                tag: self.tag.clone()?,
            }),
            "reject" => Some(Operation::Reject {
                tag: self.tag.clone()?,
                reason: self.reason.clone().unwrap_or_default(),
            }),
            "deliver" => Some(Operation::Deliver {
                tag: self.tag.clone()?,
            }),
            _ => None,
        }
    }
}

/// A parsed batch operation.
#[derive(Debug, Clone)]
pub enum Operation {
    Register {
        employee: String,
        email: String,
        first_name: String,
        last_name: String,
    },
    Deactivate {
        employee: String,
    },
    Reactivate {
        employee: String,
    },
    Allocate {
        employee: String,
        points: i64,
        event: String,
        description: String,
    },
    Product {
        tag: String,
        name: String,
        description: String,
        points: i64,
        stock: u32,
    },
    Restock {
        tag: String,
        stock: u32,
    },
    Redeem {
        tag: String,
        employee: String,
        product: String,
    },
    Approve {
        tag: String,
    },
    Reject {
        tag: String,
        reason: String,
    },
    Deliver {
        tag: String,
    },
}

/// Applies a stream of CSV operations to an engine.
#[derive(Debug, Default)]
pub struct BatchRunner {
    engine: RewardsEngine,
    product_tags: HashMap<String, Uuid>,
    redemption_tags: HashMap<String, Uuid>,
}

impl BatchRunner {
    /// Creates a runner over a fresh engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the engine the batch has been applied to.
    pub fn engine(&self) -> &RewardsEngine {
        &self.engine
    }

    /// Processes operations from a CSV reader in streaming fashion.
    ///
    /// Rows are read one at a time. Invalid rows and failing operations
    /// are logged at warn level and skipped.
    pub fn process_csv<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        for (row_idx, result) in csv_reader.deserialize::<OperationRecord>().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            match result {
                Ok(record) => {
                    if let Some(operation) = record.parse() {
                        if let Err(e) = self.apply(operation) {
                            warn!("Row {}: {}", row_num, e);
                        }
                    } else {
                        warn!("Row {}: unknown or incomplete operation", row_num);
                    }
                }
                Err(e) => {
                    warn!("Row {}: CSV parse error: {}", row_num, e);
                }
            }
        }

        Ok(())
    }

    /// Applies one parsed operation to the engine.
    pub fn apply(&mut self, operation: Operation) -> Result<()> {
        match operation {
            Operation::Register {
                employee,
                email,
                first_name,
                last_name,
            } => {
                self.engine
                    .create_account(&employee, &email, &first_name, &last_name)?;
            }
            Operation::Deactivate { employee } => {
                self.engine.deactivate_account(&employee)?;
            }
            Operation::Reactivate { employee } => {
                self.engine.reactivate_account(&employee)?;
            }
            Operation::Allocate {
                employee,
                points,
                event,
                description,
            } => {
                self.engine
                    .allocate_points(&employee, points, &event, &description)?;
            }
            Operation::Product {
                tag,
                name,
                description,
                points,
                stock,
            } => {
                let product = self
                    .engine
                    .create_product(&name, &description, points, stock)?;
                debug!("tag {} -> product {}", tag, product.id);
                self.product_tags.insert(tag, product.id);
            }
            Operation::Restock { tag, stock } => {
                let product_id = self.product_tag(&tag)?;
                self.engine.set_stock(product_id, stock)?;
            }
            Operation::Redeem {
                tag,
                employee,
                product,
            } => {
                let product_id = self.product_tag(&product)?;
                let redemption = self.engine.request_redemption(&employee, product_id)?;
                debug!("tag {} -> redemption {}", tag, redemption.id);
                self.redemption_tags.insert(tag, redemption.id);
            }
            Operation::Approve { tag } => {
                let redemption_id = self.redemption_tag(&tag)?;
                self.engine.approve_redemption(redemption_id)?;
            }
            Operation::Reject { tag, reason } => {
                let redemption_id = self.redemption_tag(&tag)?;
                self.engine.reject_redemption(redemption_id, &reason)?;
            }
            Operation::Deliver { tag } => {
                let redemption_id = self.redemption_tag(&tag)?;
                self.engine.mark_delivered(redemption_id)?;
            }
        }
        Ok(())
    }

    /// Writes final account states to CSV, sorted by employee id for
    /// deterministic output.
    pub fn write_output<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["employee", "email", "active", "balance"])?;

        for account in self.engine.list_accounts() {
            csv_writer.write_record([
                account.employee_id.clone(),
                account.email.clone(),
                account.active.to_string(),
                account.balance.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    fn product_tag(&self, tag: &str) -> Result<Uuid> {
        self.product_tags
            .get(tag)
            .copied()
            .ok_or_else(|| crate::error::RewardsError::not_found("product tag", tag))
    }

    fn redemption_tag(&self, tag: &str) -> Result<Uuid> {
        self.redemption_tags
            .get(tag)
            .copied()
            .ok_or_else(|| crate::error::RewardsError::not_found("redemption tag", tag))
    }
}
