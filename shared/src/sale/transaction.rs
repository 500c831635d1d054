//! Checkout submission types
//!
//! `POST api/transactions` takes a [`CheckoutRequest`] and answers with
//! `ApiResponse<TransactionRecord>`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CartLine, DiscountType, PaymentMethod};
use crate::types::Timestamp;

/// One submitted line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    #[serde(rename = "productVariantId")]
    pub variant_id: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl From<&CartLine> for CheckoutLine {
    fn from(line: &CartLine) -> Self {
        Self {
            variant_id: line.variant_id.clone(),
            quantity: line.quantity,
            price: line.unit_price,
        }
    }
}

/// Checkout request body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(alias = "cabangId")]
    pub branch_id: String,
    pub items: Vec<CheckoutLine>,
    pub payment_method: PaymentMethod,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    pub discount_type: DiscountType,
    /// Discount resolved to an amount
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub cash_received: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_no: Option<String>,
}

/// Server-side record of a completed sale
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub transaction_no: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub created_at: Timestamp,
}
