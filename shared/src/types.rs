//! Common types for the shared crate

/// Timestamp type (Unix milliseconds)
pub type Timestamp = i64;

/// Monetary amount
pub type Money = rust_decimal::Decimal;
