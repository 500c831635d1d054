//! Shared types for the point-of-sale cart

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Payment / Discount
// ============================================================================

/// Payment method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Debit,
    Transfer,
    Qris,
}

impl PaymentMethod {
    /// Only cash payments produce change
    pub fn is_cash(&self) -> bool {
        matches!(self, Self::Cash)
    }

    /// Non-cash methods that carry a bank name / reference number
    pub fn requires_reference(&self) -> bool {
        matches!(self, Self::Debit | Self::Transfer)
    }
}

/// How the checkout discount is interpreted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// Fixed amount off the subtotal
    #[default]
    Nominal,
    /// Percentage (0-100) of the subtotal
    Percentage,
}

// ============================================================================
// Cart Line
// ============================================================================

/// One line of the active (or a held) cart
///
/// `variant_id` is unique within a cart. `cached_available_stock` is the
/// branch stock seen when the line was last added or synced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub variant_id: String,
    pub product_name: String,
    /// Variant label, empty for single-kind products and default variants
    #[serde(default)]
    pub variant_label: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub cached_available_stock: i32,
}

impl CartLine {
    /// unit_price × quantity
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Quantity exceeds the last known stock (after a stock drop)
    pub fn is_oversold(&self) -> bool {
        self.quantity > self.cached_available_stock
    }
}

// ============================================================================
// Checkout Metadata
// ============================================================================

/// Checkout form fields that travel with a held transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutMetadata {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Discount value, interpreted per `discount_type`
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(default)]
    pub bank_name: String,
    #[serde(default)]
    pub reference_no: String,
}
