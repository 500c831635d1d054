//! Product Model
//!
//! Catalog products as returned by `GET api/products?branchId=…`. Each
//! variant carries its per-branch stock records; a client only ever reads
//! the record of its active branch.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductKind {
    /// Product with a single implicit variant
    #[default]
    Single,
    /// Product with selectable variants (size, colour, ...)
    Variant,
}

/// Stock of one variant at one branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    /// Branch reference
    #[serde(alias = "cabangId")]
    pub branch_id: String,
    /// Units on hand (non-positive means sold out)
    pub quantity: i32,
    /// Unit price at this branch
    #[serde(default)]
    pub price: Decimal,
}

impl StockRecord {
    pub fn new(branch_id: impl Into<String>, quantity: i32, price: Decimal) -> Self {
        Self {
            branch_id: branch_id.into(),
            quantity,
            price,
        }
    }

    /// Whether at least one unit can be sold
    pub fn is_available(&self) -> bool {
        self.quantity > 0
    }
}

/// Product variant entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: String,
    pub sku: String,
    /// Variant attribute name (e.g. "Size")
    #[serde(default)]
    pub variant_name: String,
    /// Variant label shown on the cart line (e.g. "XL", "Default")
    #[serde(default)]
    pub variant_value: String,
    /// Per-branch stock records
    #[serde(default)]
    pub stocks: Vec<StockRecord>,
}

impl ProductVariant {
    /// Stock record for the given branch, if any
    pub fn stock_at(&self, branch_id: &str) -> Option<&StockRecord> {
        self.stocks.iter().find(|s| s.branch_id == branch_id)
    }

    /// Mutable stock record for the given branch, if any
    pub fn stock_at_mut(&mut self, branch_id: &str) -> Option<&mut StockRecord> {
        self.stocks.iter_mut().find(|s| s.branch_id == branch_id)
    }
}

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default, alias = "productType")]
    pub product_kind: ProductKind,
    /// Category reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// Find a variant of this product by id
    pub fn variant(&self, variant_id: &str) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }
}
