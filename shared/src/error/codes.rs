//! Unified error codes for the Kasir POS
//!
//! This module defines all error codes used across the POS server, client
//! engine and frontend. Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Branch errors
//! - 4xxx: Sale errors (cart, held transactions, checkout)
//! - 5xxx: Payment errors
//! - 6xxx: Product and stock errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Cashier is pinned to the assigned branch
    BranchPinned = 2002,

    // ==================== 3xxx: Branch ====================
    /// No branch selected yet
    BranchNotSelected = 3001,
    /// Branch not found
    BranchNotFound = 3002,
    /// Branch is not active
    BranchInactive = 3003,

    // ==================== 4xxx: Sale ====================
    /// Cart is empty
    CartEmpty = 4001,
    /// Cart line not found
    CartLineNotFound = 4002,
    /// Held transaction not found
    HeldTransactionNotFound = 4003,
    /// Checkout rejected by the server
    CheckoutRejected = 4004,
    /// Checkout already in progress
    CheckoutInProgress = 4005,

    // ==================== 5xxx: Payment ====================
    /// Insufficient payment amount
    PaymentInsufficientAmount = 5002,

    // ==================== 6xxx: Product ====================
    /// Product is out of stock
    ProductOutOfStock = 6003,
    /// Variant not found
    VariantNotFound = 6004,
    /// Requested quantity exceeds available stock
    InsufficientStock = 6005,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Network error
    NetworkError = 9003,
    /// Timeout error
    TimeoutError = 9004,
    /// Client storage could not be read or written
    StorageError = 9401,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::BranchPinned => "Cashier cannot change branch",

            // Branch
            ErrorCode::BranchNotSelected => "No branch selected",
            ErrorCode::BranchNotFound => "Branch not found",
            ErrorCode::BranchInactive => "Branch is not active",

            // Sale
            ErrorCode::CartEmpty => "Cart is empty",
            ErrorCode::CartLineNotFound => "Cart line not found",
            ErrorCode::HeldTransactionNotFound => "Held transaction not found",
            ErrorCode::CheckoutRejected => "Checkout was rejected",
            ErrorCode::CheckoutInProgress => "Checkout is already in progress",

            // Payment
            ErrorCode::PaymentInsufficientAmount => "Insufficient payment amount",

            // Product
            ErrorCode::ProductOutOfStock => "Product is out of stock",
            ErrorCode::VariantNotFound => "Product variant not found",
            ErrorCode::InsufficientStock => "Insufficient stock",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::StorageError => "Client storage error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::BranchPinned),

            // Branch
            3001 => Ok(ErrorCode::BranchNotSelected),
            3002 => Ok(ErrorCode::BranchNotFound),
            3003 => Ok(ErrorCode::BranchInactive),

            // Sale
            4001 => Ok(ErrorCode::CartEmpty),
            4002 => Ok(ErrorCode::CartLineNotFound),
            4003 => Ok(ErrorCode::HeldTransactionNotFound),
            4004 => Ok(ErrorCode::CheckoutRejected),
            4005 => Ok(ErrorCode::CheckoutInProgress),

            // Payment
            5002 => Ok(ErrorCode::PaymentInsufficientAmount),

            // Product
            6003 => Ok(ErrorCode::ProductOutOfStock),
            6004 => Ok(ErrorCode::VariantNotFound),
            6005 => Ok(ErrorCode::InsufficientStock),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9401 => Ok(ErrorCode::StorageError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
