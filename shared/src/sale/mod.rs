//! Sale types: cart lines, checkout metadata, held transactions and the
//! checkout submission payloads.

mod held;
mod transaction;
mod types;

pub use held::HeldTransaction;
pub use transaction::{CheckoutLine, CheckoutRequest, TransactionRecord};
pub use types::{CartLine, CheckoutMetadata, DiscountType, PaymentMethod};
