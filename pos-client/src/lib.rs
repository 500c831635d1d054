//! Kasir POS client engine
//!
//! Client-side state core of the point of sale: catalog cache, cart,
//! held transactions, checkout computation and the stock reconciliation
//! channel that keeps them consistent with stock pushed by other terminals.

pub mod branch;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod engine;
pub mod error;
pub mod held;
pub mod http;
pub mod logger;
pub mod reconcile;
pub mod session;
pub mod source;
pub mod storage;

pub use config::ClientConfig;
pub use engine::{EngineCommand, PosEngine};
pub use error::{ClientError, ClientResult, PosError, PosResult};
pub use http::HttpClient;
pub use reconcile::{CatalogEvent, Reconcile};
pub use session::{FetchOutcome, PosSession};
pub use source::{CatalogSource, CheckoutGateway};

// Re-export shared types for convenience
pub use shared::error::{ApiResponse, AppError, ErrorCode};
pub use shared::message::{BusMessage, EventType};
