use std::collections::HashMap;

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;
use super::product::Product;

/// A single cart line: a product snapshot plus the chosen quantity.
///
/// `quantity` is always >= 1; a quantity that would drop below 1 removes the
/// line instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: BigDecimal,
    pub image_url: Option<String>,
    pub quantity: i32,
}

/// The shopper's in-progress selection, not yet committed to an order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add `qty` units of `product`. If the product is already in the cart the
    /// existing line is incremented; the resulting quantity is clamped to the
    /// product's current stock.
    pub fn add(&mut self, product: &Product, qty: i32) -> Result<(), DomainError> {
        if qty < 1 {
            return Err(DomainError::InvalidInput(
                "quantity must be at least 1".to_string(),
            ));
        }
        if product.stock < 1 {
            return Err(DomainError::InvalidInput(format!(
                "product '{}' is out of stock",
                product.name
            )));
        }

        match self.lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => {
                line.quantity = (line.quantity.saturating_add(qty)).min(product.stock);
            }
            None => {
                self.lines.push(CartLine {
                    product_id: product.id,
                    name: product.name.clone(),
                    unit_price: product.price.clone(),
                    image_url: product.image_url.clone(),
                    quantity: qty.min(product.stock),
                });
            }
        }
        Ok(())
    }

    /// Set the quantity of an existing line. A quantity below 1 removes the
    /// line; a quantity above `stock` is clamped to `stock`, never an error.
    pub fn update_quantity(
        &mut self,
        product_id: Uuid,
        qty: i32,
        stock: i32,
    ) -> Result<(), DomainError> {
        let Some(pos) = self.lines.iter().position(|l| l.product_id == product_id) else {
            return Err(DomainError::NotFound);
        };

        if qty < 1 || stock < 1 {
            self.lines.remove(pos);
        } else {
            self.lines[pos].quantity = qty.min(stock);
        }
        Ok(())
    }

    /// Remove a line. Idempotent: removing an absent product is a no-op.
    pub fn remove(&mut self, product_id: Uuid) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    /// Sum of `unit_price * quantity` across all lines.
    pub fn subtotal(&self) -> BigDecimal {
        self.lines
            .iter()
            .fold(BigDecimal::zero(), |acc, l| {
                acc + &l.unit_price * BigDecimal::from(l.quantity)
            })
    }

    /// Opportunistic reconciliation against live stock: any line whose
    /// quantity now exceeds the product's stock is clamped down (never up),
    /// and a line whose product vanished or dropped to zero stock is removed.
    ///
    /// Returns `true` if the cart was changed and should be persisted.
    pub fn reconcile(&mut self, stock_by_product: &HashMap<Uuid, i32>) -> bool {
        let before = self.lines.len();
        let mut changed = false;

        self.lines.retain(|l| {
            matches!(stock_by_product.get(&l.product_id), Some(&s) if s >= 1)
        });
        changed |= self.lines.len() != before;

        for line in &mut self.lines {
            let stock = stock_by_product[&line.product_id];
            if line.quantity > stock {
                line.quantity = stock;
                changed = true;
            }
        }
        changed
    }
}
