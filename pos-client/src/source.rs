//! Collaborator seams for the engine
//!
//! [`crate::HttpClient`] implements both traits; tests substitute in-memory
//! fakes.

use async_trait::async_trait;
use shared::models::{Branch, Product};
use shared::sale::{CheckoutRequest, TransactionRecord};

use crate::ClientResult;

/// Source of catalog and branch data
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Full product list with stock for the given branch
    async fn fetch_products(&self, branch_id: &str) -> ClientResult<Vec<Product>>;

    /// Active branches
    async fn fetch_branches(&self) -> ClientResult<Vec<Branch>>;
}

/// Checkout submission
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn submit(&self, request: &CheckoutRequest) -> ClientResult<TransactionRecord>;
}
