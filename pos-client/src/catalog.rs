//! Catalog Cache
//!
//! Products with their per-branch stock, replaced wholesale on a full fetch
//! and patched by stock-push events in between.

use std::collections::HashMap;

use rust_decimal::Decimal;
use shared::message::StockChange;
use shared::models::{Product, ProductVariant, StockRecord};

/// Result of applying a pushed stock change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockApply {
    Applied,
    /// Version older than the last applied one for this key
    Stale { current: u64 },
    UnknownVariant,
}

/// Stock display info for the product grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockInfo {
    /// Stock left after what is already in the cart
    pub available: i32,
}

impl StockInfo {
    pub fn is_sold_out(&self) -> bool {
        self.available <= 0
    }

    /// Cashier-facing label, in Indonesian like the rest of the POS
    pub fn label(&self) -> String {
        if self.is_sold_out() {
            "Habis".to_string()
        } else {
            format!("{} pcs", self.available)
        }
    }
}

/// Display stock for a variant given what the cart already holds
pub fn stock_info(quantity: i32, in_cart: i32) -> StockInfo {
    StockInfo {
        available: quantity - in_cart,
    }
}

/// Tidy a variant value for display
///
/// `|` separators collapse to spaces. Pure numbers and "word number"
/// values are kept as is; otherwise a leading copy of the variant name is
/// stripped ("Size XL" under "Size" shows as "XL").
pub fn format_variant_display(variant_name: &str, variant_value: &str) -> String {
    let clean = variant_value
        .split('|')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string();

    if !clean.is_empty() && clean.chars().all(|c| c.is_ascii_digit()) {
        return clean;
    }
    if is_word_number(&clean) {
        return clean;
    }

    if clean.to_lowercase().starts_with(&variant_name.to_lowercase())
        && let Some(rest) = clean.get(variant_name.len()..)
    {
        return rest.trim().to_string();
    }

    clean
}

/// `^[a-zA-Z]+\s+\d+$`
fn is_word_number(value: &str) -> bool {
    let word_end = value
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(value.len());
    if word_end == 0 {
        return false;
    }
    let rest = &value[word_end..];
    let digits = rest.trim_start();
    digits.len() < rest.len() && !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[derive(Debug, Default)]
pub struct CatalogCache {
    products: Vec<Product>,
    /// Last applied stock version per (variant_id, branch_id)
    versions: HashMap<(String, String), u64>,
    versioning: bool,
}

impl CatalogCache {
    pub fn new(versioning: bool) -> Self {
        Self {
            products: Vec::new(),
            versions: HashMap::new(),
            versioning,
        }
    }

    /// Replace the whole catalog after a full fetch
    pub fn replace_all(&mut self, products: Vec<Product>) {
        self.products = products;
        self.versions.clear();
    }

    /// Replace a product by id, or append it
    pub fn upsert_product(&mut self, product: Product) {
        match self.products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => self.products.push(product),
        }
    }

    /// Returns whether a product was removed
    pub fn remove_product(&mut self, product_id: &str) -> bool {
        let before = self.products.len();
        self.products.retain(|p| p.id != product_id);
        self.products.len() != before
    }

    /// Set stock for a variant at a branch, creating the branch record when
    /// missing. Returns false for an unknown variant.
    pub fn upsert_variant_stock(&mut self, branch_id: &str, variant_id: &str, quantity: i32, price: Decimal) -> bool {
        let Some(variant) = self.variant_mut(variant_id) else {
            return false;
        };
        match variant.stock_at_mut(branch_id) {
            Some(stock) => {
                stock.quantity = quantity;
                stock.price = price;
            }
            None => variant.stocks.push(StockRecord::new(branch_id, quantity, price)),
        }
        true
    }

    /// Apply a pushed stock change, honouring per-key versions when enabled
    pub fn apply_stock_change(&mut self, change: &StockChange, version: Option<u64>) -> StockApply {
        let key = (change.variant_id.clone(), change.branch_id.clone());

        if self.versioning
            && let (Some(version), Some(&current)) = (version, self.versions.get(&key))
            && version < current
        {
            return StockApply::Stale { current };
        }

        if !self.upsert_variant_stock(&change.branch_id, &change.variant_id, change.quantity, change.price) {
            return StockApply::UnknownVariant;
        }

        if self.versioning
            && let Some(version) = version
        {
            self.versions.insert(key, version);
        }
        StockApply::Applied
    }

    /// Stock record for a variant at a branch; None means zero stock
    pub fn stock_for(&self, variant_id: &str, branch_id: &str) -> Option<&StockRecord> {
        self.variant(variant_id)?.stock_at(branch_id)
    }

    pub fn variant(&self, variant_id: &str) -> Option<&ProductVariant> {
        self.products.iter().find_map(|p| p.variant(variant_id))
    }

    /// Variant together with its parent product
    pub fn find_variant(&self, variant_id: &str) -> Option<(&Product, &ProductVariant)> {
        self.products
            .iter()
            .find_map(|p| p.variant(variant_id).map(|v| (p, v)))
    }

    fn variant_mut(&mut self, variant_id: &str) -> Option<&mut ProductVariant> {
        self.products
            .iter_mut()
            .flat_map(|p| p.variants.iter_mut())
            .find(|v| v.id == variant_id)
    }

    pub fn product(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == product_id)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Products whose name or any variant SKU contains `query`
    /// (case-insensitive), optionally restricted to a category
    pub fn search(&self, query: &str, category_id: Option<&str>) -> Vec<&Product> {
        let needle = query.trim().to_lowercase();
        self.products
            .iter()
            .filter(|p| category_id.is_none_or(|c| p.category_id.as_deref() == Some(c)))
            .filter(|p| {
                needle.is_empty()
                    || p.name.to_lowercase().contains(&needle)
                    || p.variants.iter().any(|v| v.sku.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Last applied stock version for a key
    pub fn stock_version(&self, variant_id: &str, branch_id: &str) -> Option<u64> {
        self.versions
            .get(&(variant_id.to_string(), branch_id.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
