//! Client error types

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::storage::StorageError;

/// Client error type (HTTP transport and API envelope failures)
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// The server answered with an error envelope
    #[error("{0}")]
    Api(AppError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Message to show the cashier; server messages are passed through verbatim
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.message.clone(),
            Self::Forbidden(msg) | Self::NotFound(msg) | Self::Validation(msg) | Self::Internal(msg)
                if !msg.is_empty() =>
            {
                msg.clone()
            }
            other => other.to_string(),
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Engine error type
///
/// No variant is fatal: every failing operation leaves the stores in their
/// last consistent state.
#[derive(Debug, Error)]
pub enum PosError {
    #[error("Insufficient stock for {variant_id}: requested {requested}, available {available}")]
    InsufficientStock {
        variant_id: String,
        requested: i32,
        available: i32,
    },

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    #[error("Held transaction not found: {0}")]
    HeldNotFound(i64),

    #[error("Variant not found: {0}")]
    VariantNotFound(String),

    #[error("No branch selected")]
    NoBranchSelected,

    #[error("Cashier is pinned to branch {0}")]
    BranchPinned(String),

    #[error("Branch not found: {0}")]
    BranchNotFound(String),

    #[error("Branch is not active: {0}")]
    BranchInactive(String),

    #[error("Invalid discount: {0}")]
    InvalidDiscount(String),

    #[error("Cash received {received} does not cover total {total}")]
    InsufficientPayment { total: Decimal, received: Decimal },

    #[error("Checkout already in progress")]
    CheckoutInProgress,

    #[error("Checkout rejected: {0}")]
    CheckoutRejected(String),

    #[error("Network failure: {0}")]
    Network(#[from] ClientError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl PosError {
    /// Shared error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InsufficientStock { available, .. } if *available <= 0 => ErrorCode::ProductOutOfStock,
            Self::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            Self::EmptyCart => ErrorCode::CartEmpty,
            Self::LineNotFound(_) => ErrorCode::CartLineNotFound,
            Self::HeldNotFound(_) => ErrorCode::HeldTransactionNotFound,
            Self::VariantNotFound(_) => ErrorCode::VariantNotFound,
            Self::NoBranchSelected => ErrorCode::BranchNotSelected,
            Self::BranchPinned(_) => ErrorCode::BranchPinned,
            Self::BranchNotFound(_) => ErrorCode::BranchNotFound,
            Self::BranchInactive(_) => ErrorCode::BranchInactive,
            Self::InvalidDiscount(_) => ErrorCode::ValueOutOfRange,
            Self::InsufficientPayment { .. } => ErrorCode::PaymentInsufficientAmount,
            Self::CheckoutInProgress => ErrorCode::CheckoutInProgress,
            Self::CheckoutRejected(_) => ErrorCode::CheckoutRejected,
            Self::Network(ClientError::Api(err)) => err.code,
            Self::Network(ClientError::Unauthorized) => ErrorCode::NotAuthenticated,
            Self::Network(ClientError::Forbidden(_)) => ErrorCode::PermissionDenied,
            Self::Network(ClientError::Http(e)) if e.is_timeout() => ErrorCode::TimeoutError,
            Self::Network(_) => ErrorCode::NetworkError,
            Self::Storage(_) => ErrorCode::StorageError,
        }
    }
}

impl From<PosError> for AppError {
    fn from(err: PosError) -> Self {
        let code = err.code();
        let app = AppError::with_message(code, err.to_string());
        match err {
            PosError::InsufficientStock {
                variant_id,
                requested,
                available,
            } => app
                .with_detail("variant_id", variant_id)
                .with_detail("requested", requested)
                .with_detail("available", available),
            PosError::HeldNotFound(id) => app.with_detail("held_id", id),
            PosError::LineNotFound(id) | PosError::VariantNotFound(id) => app.with_detail("variant_id", id),
            PosError::BranchPinned(id) | PosError::BranchNotFound(id) | PosError::BranchInactive(id) => {
                app.with_detail("branch_id", id)
            }
            _ => app,
        }
    }
}

/// Result type for engine operations
pub type PosResult<T> = Result<T, PosError>;
