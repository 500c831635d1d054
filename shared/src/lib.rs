//! Shared types for the Kasir POS
//!
//! Wire/data model used by both the POS server and the client engine:
//! catalog models, sale types, message bus envelope, error codes and
//! id/time utilities.

pub mod error;
pub mod message;
pub mod models;
pub mod sale;
pub mod types;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Message bus re-exports (for convenient access)
pub use message::{BusMessage, EventType};
