//! Product catalog and inventory.

use crate::error::{Result, RewardsError};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Upper bound on a product's point price.
pub const MAX_REQUIRED_POINTS: i64 = 100_000;

/// A redeemable product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product id, generated at creation.
    pub id: Uuid,

    /// Display name.
    pub name: String,

    /// Display description.
    pub description: String,

    /// Point price, in `1..=MAX_REQUIRED_POINTS`.
    pub required_points: i64,

    /// Units left in inventory.
    pub stock: u32,
}

impl Product {
    /// A product is available while it has stock.
    pub fn is_available(&self) -> bool {
        self.stock > 0
    }
}

/// Mapping of product id to product record.
#[derive(Debug, Default)]
pub struct CatalogStore {
    products: HashMap<Uuid, Product>,
}

impl CatalogStore {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product and returns it with its generated id.
    pub fn create(
        &mut self,
        name: &str,
        description: &str,
        required_points: i64,
        stock: u32,
    ) -> Result<&Product> {
        let name = require_field(name, "product name")?;
        let description = require_field(description, "product description")?;
        validate_required_points(required_points)?;

        let product = Product {
            id: Uuid::new_v4(),
            name,
            description,
            required_points,
            stock,
        };
        Ok(self.products.entry(product.id).or_insert(product))
    }

    /// Looks up a product by id.
    pub fn get(&self, product_id: Uuid) -> Option<&Product> {
        self.products.get(&product_id)
    }

    /// Returns all products, sorted by name for deterministic output.
    pub fn list(&self) -> Vec<&Product> {
        let mut products: Vec<_> = self.products.values().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        products
    }

    /// Updates name, description, and point price together.
    pub fn update(
        &mut self,
        product_id: Uuid,
        name: &str,
        description: &str,
        required_points: i64,
    ) -> Result<()> {
        let name = require_field(name, "product name")?;
        let description = require_field(description, "product description")?;
        validate_required_points(required_points)?;

        let product = self.get_mut(product_id)?;
        product.name = name;
        product.description = description;
        product.required_points = required_points;
        Ok(())
    }

    /// Overwrites the stock count.
    pub fn set_stock(&mut self, product_id: Uuid, stock: u32) -> Result<()> {
        self.get_mut(product_id)?.stock = stock;
        Ok(())
    }

    /// Removes a product from the catalog.
    ///
    /// In-flight redemptions keep referencing it by value; only future
    /// lookups and requests see the removal.
    pub fn remove(&mut self, product_id: Uuid) -> Result<Product> {
        self.products
            .remove(&product_id)
            .ok_or_else(|| RewardsError::not_found("product", product_id.to_string()))
    }

    /// Takes `qty` units out of stock.
    ///
    /// Crate-internal: only the redemption workflow may reserve, so a
    /// decrement always has a matching redemption record and no orphaned
    /// reservation can exist. Fails with `OutOfStock` when stock < qty.
    pub(crate) fn reserve(&mut self, product_id: Uuid, qty: u32) -> Result<()> {
        let product = self.get_mut(product_id)?;
        if product.stock < qty {
            return Err(RewardsError::OutOfStock {
                product: product.name.clone(),
            });
        }
        product.stock -= qty;
        Ok(())
    }

    fn get_mut(&mut self, product_id: Uuid) -> Result<&mut Product> {
        self.products
            .get_mut(&product_id)
            .ok_or_else(|| RewardsError::not_found("product", product_id.to_string()))
    }
}

fn require_field(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RewardsError::invalid(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn validate_required_points(points: i64) -> Result<()> {
    if points <= 0 {
        return Err(RewardsError::invalid(format!(
            "required points must be positive, got {points}"
        )));
    }
    if points > MAX_REQUIRED_POINTS {
        return Err(RewardsError::invalid(format!(
            "required points cannot exceed {MAX_REQUIRED_POINTS}"
        )));
    }
    Ok(())
}
