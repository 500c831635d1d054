//! Cart Store
//!
//! The active cart. Every successful mutation keeps
//! `quantity <= cached_available_stock` for the touched line; only
//! [`CartStore::sync_stock`] may leave a line oversold.

use rust_decimal::Decimal;
use shared::models::{Product, ProductKind, ProductVariant, StockRecord};
use shared::sale::CartLine;
use tracing::{debug, warn};

use crate::{PosError, PosResult};

/// Variant labels that mean "no real variant"
const DEFAULT_VARIANT_LABELS: [&str; 5] = ["default", "standar", "standard", "default:", "-"];

/// Label shown on the cart line; blank for single-kind products and default
/// variants
pub fn variant_label(product: &Product, variant: &ProductVariant) -> String {
    let label = variant.variant_value.to_lowercase();
    if product.product_kind == ProductKind::Single || DEFAULT_VARIANT_LABELS.iter().any(|d| label.contains(d)) {
        String::new()
    } else {
        variant.variant_value.clone()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CartStore {
    lines: Vec<CartLine>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `variant`, checked against `stock` (the record for the
    /// active branch). Returns the line's new quantity.
    pub fn add_line(&mut self, product: &Product, variant: &ProductVariant, stock: Option<&StockRecord>) -> PosResult<i32> {
        let Some(stock) = stock.filter(|s| s.quantity > 0) else {
            warn!(variant_id = %variant.id, "Add rejected: out of stock");
            return Err(PosError::InsufficientStock {
                variant_id: variant.id.clone(),
                requested: self.quantity_of(&variant.id) + 1,
                available: stock.map_or(0, |s| s.quantity.max(0)),
            });
        };

        if let Some(line) = self.lines.iter_mut().find(|l| l.variant_id == variant.id) {
            let requested = line.quantity + 1;
            if requested > stock.quantity {
                warn!(variant_id = %variant.id, requested, available = stock.quantity, "Add rejected: insufficient stock");
                return Err(PosError::InsufficientStock {
                    variant_id: variant.id.clone(),
                    requested,
                    available: stock.quantity,
                });
            }
            line.quantity = requested;
            line.cached_available_stock = stock.quantity;
            debug!(variant_id = %variant.id, quantity = requested, "Cart line incremented");
            return Ok(requested);
        }

        self.lines.push(CartLine {
            variant_id: variant.id.clone(),
            product_name: product.name.clone(),
            variant_label: variant_label(product, variant),
            sku: variant.sku.clone(),
            unit_price: stock.price,
            quantity: 1,
            cached_available_stock: stock.quantity,
        });
        debug!(variant_id = %variant.id, "Cart line added");
        Ok(1)
    }

    /// Set a line's quantity; zero or less removes the line
    pub fn update_quantity(&mut self, variant_id: &str, quantity: i32) -> PosResult<()> {
        if quantity <= 0 {
            if self.remove_line(variant_id) {
                debug!(variant_id, "Cart line removed by quantity update");
            }
            return Ok(());
        }

        let Some(line) = self.lines.iter_mut().find(|l| l.variant_id == variant_id) else {
            return Err(PosError::LineNotFound(variant_id.to_string()));
        };
        if quantity > line.cached_available_stock {
            return Err(PosError::InsufficientStock {
                variant_id: variant_id.to_string(),
                requested: quantity,
                available: line.cached_available_stock,
            });
        }
        line.quantity = quantity;
        Ok(())
    }

    /// Returns whether a line was removed
    pub fn remove_line(&mut self, variant_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.variant_id != variant_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Refresh a line's cached stock and price after a stock push.
    ///
    /// The quantity is never clamped: a line can end up oversold until the
    /// cashier adjusts it. Returns false when the variant is not in the cart.
    pub fn sync_stock(&mut self, variant_id: &str, quantity: i32, price: Decimal) -> bool {
        let Some(line) = self.lines.iter_mut().find(|l| l.variant_id == variant_id) else {
            return false;
        };
        line.cached_available_stock = quantity;
        line.unit_price = price;
        if line.is_oversold() {
            warn!(variant_id, quantity = line.quantity, available = quantity, "Cart line oversold after stock update");
        }
        true
    }

    /// Σ quantity × unit_price
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Total units
    pub fn item_count(&self) -> i32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn line_for(&self, variant_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.variant_id == variant_id)
    }

    /// Quantity of a variant in the cart (0 when absent)
    pub fn quantity_of(&self, variant_id: &str) -> i32 {
        self.line_for(variant_id).map_or(0, |l| l.quantity)
    }

    /// Lines whose quantity exceeds their cached stock
    pub fn oversold_lines(&self) -> Vec<&CartLine> {
        self.lines.iter().filter(|l| l.is_oversold()).collect()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Move all lines out, leaving the cart empty
    pub fn take_lines(&mut self) -> Vec<CartLine> {
        std::mem::take(&mut self.lines)
    }

    /// Replace the cart contents
    pub fn restore_lines(&mut self, lines: Vec<CartLine>) {
        self.lines = lines;
    }
}
