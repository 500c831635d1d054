//! Data models
//!
//! Shared between the POS server and client engine (via API).
//! Wire format is camelCase JSON; legacy `cabangId` keys are accepted as
//! aliases for `branchId`.

pub mod branch;
pub mod product;
pub mod user;

// Re-exports
pub use branch::*;
pub use product::*;
pub use user::*;
