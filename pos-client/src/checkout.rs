//! Checkout Computation
//!
//! Totals are derived from the cart on every read; nothing here is cached.

use rust_decimal::prelude::*;
use shared::sale::{CheckoutLine, CheckoutMetadata, CheckoutRequest, DiscountType, PaymentMethod, TransactionRecord};
use shared::types::Money;

use crate::cart::CartStore;
use crate::{PosError, PosResult};

/// Rounding for displayed monetary values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

#[inline]
pub fn round_money(value: Money) -> Money {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Discount resolved to an amount
pub fn discount_amount(subtotal: Money, discount: Money, discount_type: DiscountType) -> Money {
    match discount_type {
        DiscountType::Percentage => subtotal * discount / Decimal::ONE_HUNDRED,
        DiscountType::Nominal => discount,
    }
}

/// subtotal − discount, floored at zero
pub fn total(subtotal: Money, discount: Money, discount_type: DiscountType) -> Money {
    (subtotal - discount_amount(subtotal, discount, discount_type)).max(Decimal::ZERO)
}

/// Change for a cash payment; None when the cash does not cover the total
pub fn change_due(total: Money, cash_received: Money) -> Option<Money> {
    (cash_received >= total).then(|| cash_received - total)
}

/// Reject negative discounts and percentages above 100
pub fn validate_discount(discount: Money, discount_type: DiscountType) -> PosResult<()> {
    if discount < Decimal::ZERO {
        return Err(PosError::InvalidDiscount(format!("discount must be non-negative, got {discount}")));
    }
    if discount_type == DiscountType::Percentage && discount > Decimal::ONE_HUNDRED {
        return Err(PosError::InvalidDiscount(format!("percentage must be at most 100, got {discount}")));
    }
    Ok(())
}

/// Derived checkout figures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub total: Money,
    pub item_count: i32,
}

impl CheckoutSummary {
    pub fn compute(cart: &CartStore, metadata: &CheckoutMetadata) -> Self {
        let subtotal = cart.subtotal();
        Self {
            subtotal,
            discount_amount: discount_amount(subtotal, metadata.discount, metadata.discount_type),
            total: total(subtotal, metadata.discount, metadata.discount_type),
            item_count: cart.item_count(),
        }
    }
}

/// Checkout form state
#[derive(Debug, Clone, Default)]
pub struct CheckoutState {
    metadata: CheckoutMetadata,
    cash_received: Money,
    processing: bool,
    last_transaction: Option<TransactionRecord>,
    last_cash_received: Option<Money>,
}

impl CheckoutState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metadata(&self) -> &CheckoutMetadata {
        &self.metadata
    }

    pub fn set_customer(&mut self, name: impl Into<String>, phone: impl Into<String>) {
        self.metadata.customer_name = name.into();
        self.metadata.customer_phone = phone.into();
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.metadata.payment_method = method;
    }

    pub fn set_bank_details(&mut self, bank_name: impl Into<String>, reference_no: impl Into<String>) {
        self.metadata.bank_name = bank_name.into();
        self.metadata.reference_no = reference_no.into();
    }

    pub fn set_discount(&mut self, discount: Money, discount_type: DiscountType) -> PosResult<()> {
        validate_discount(discount, discount_type)?;
        self.metadata.discount = discount;
        self.metadata.discount_type = discount_type;
        Ok(())
    }

    pub fn set_cash_received(&mut self, amount: Money) {
        self.cash_received = amount;
    }

    pub fn cash_received(&self) -> Money {
        self.cash_received
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub(crate) fn set_processing(&mut self, processing: bool) {
        self.processing = processing;
    }

    pub fn last_transaction(&self) -> Option<&TransactionRecord> {
        self.last_transaction.as_ref()
    }

    pub fn last_cash_received(&self) -> Option<Money> {
        self.last_cash_received
    }

    /// Reset the form to defaults; the last transaction result is kept
    pub fn reset(&mut self) {
        self.metadata = CheckoutMetadata::default();
        self.cash_received = Decimal::ZERO;
        self.processing = false;
    }

    /// Restore the form from a held snapshot
    pub fn restore(&mut self, metadata: CheckoutMetadata) {
        self.metadata = metadata;
        self.cash_received = Decimal::ZERO;
    }

    /// Reset after a successful submission and record its result
    pub(crate) fn complete(&mut self, record: TransactionRecord) {
        let cash = self.metadata.payment_method.is_cash().then_some(self.cash_received);
        self.reset();
        self.last_transaction = Some(record);
        self.last_cash_received = cash;
    }
}

/// Build the submission body for the active cart
pub fn build_request(branch_id: &str, cart: &CartStore, state: &CheckoutState) -> CheckoutRequest {
    let metadata = state.metadata();
    let summary = CheckoutSummary::compute(cart, metadata);
    let non_empty = |s: &str| (!s.trim().is_empty()).then(|| s.trim().to_string());

    CheckoutRequest {
        branch_id: branch_id.to_string(),
        items: cart.lines().iter().map(CheckoutLine::from).collect(),
        payment_method: metadata.payment_method,
        subtotal: summary.subtotal,
        discount: metadata.discount,
        discount_type: metadata.discount_type,
        discount_amount: summary.discount_amount,
        total: summary.total,
        cash_received: metadata.payment_method.is_cash().then_some(state.cash_received()),
        customer_name: non_empty(&metadata.customer_name),
        customer_phone: non_empty(&metadata.customer_phone),
        bank_name: non_empty(&metadata.bank_name),
        reference_no: non_empty(&metadata.reference_no),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{Product, ProductKind, ProductVariant, StockRecord};

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    fn cart_with(price: i64, quantity: i32) -> CartStore {
        let product = Product {
            id: "p-1".to_string(),
            name: "Kopi".to_string(),
            product_kind: ProductKind::Single,
            category_id: None,
            variants: vec![ProductVariant {
                id: "v-1".to_string(),
                sku: "KP".to_string(),
                variant_name: String::new(),
                variant_value: "Default".to_string(),
                stocks: vec![StockRecord::new("b-1", 100, dec(price))],
            }],
        };
        let mut cart = CartStore::new();
        let variant = &product.variants[0];
        cart.add_line(&product, variant, variant.stock_at("b-1")).unwrap();
        cart.update_quantity("v-1", quantity).unwrap();
        cart
    }

    #[test]
    fn test_discount_amount() {
        assert_eq!(discount_amount(dec(100000), dec(10), DiscountType::Percentage), dec(10000));
        assert_eq!(discount_amount(dec(100000), dec(5000), DiscountType::Nominal), dec(5000));
    }

    #[test]
    fn test_total_floored_at_zero() {
        assert_eq!(total(dec(100000), dec(10), DiscountType::Percentage), dec(90000));
        assert_eq!(total(dec(3000), dec(5000), DiscountType::Nominal), Decimal::ZERO);
        assert_eq!(total(dec(3000), dec(100), DiscountType::Percentage), Decimal::ZERO);
    }

    #[test]
    fn test_change_due() {
        assert_eq!(change_due(dec(90000), dec(100000)), Some(dec(10000)));
        assert_eq!(change_due(dec(90000), dec(90000)), Some(Decimal::ZERO));
        assert_eq!(change_due(dec(90000), dec(50000)), None);
    }

    #[test]
    fn test_round_money() {
        assert_eq!(round_money(Decimal::new(12345, 3)), Decimal::new(1235, 2));
        assert_eq!(round_money(Decimal::new(-12345, 3)), Decimal::new(-1235, 2));
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount(dec(0), DiscountType::Nominal).is_ok());
        assert!(validate_discount(dec(100), DiscountType::Percentage).is_ok());
        assert!(matches!(
            validate_discount(dec(101), DiscountType::Percentage),
            Err(PosError::InvalidDiscount(_))
        ));
        assert!(validate_discount(dec(-1), DiscountType::Nominal).is_err());
        assert!(validate_discount(dec(150000), DiscountType::Nominal).is_ok());
    }

    #[test]
    fn test_summary() {
        let cart = cart_with(25000, 4);
        let metadata = CheckoutMetadata {
            discount: dec(10),
            discount_type: DiscountType::Percentage,
            ..Default::default()
        };

        let summary = CheckoutSummary::compute(&cart, &metadata);
        assert_eq!(summary.subtotal, dec(100000));
        assert_eq!(summary.discount_amount, dec(10000));
        assert_eq!(summary.total, dec(90000));
        assert_eq!(summary.item_count, 4);
    }

    #[test]
    fn test_state_reset_keeps_last_transaction() {
        let mut state = CheckoutState::new();
        state.set_customer("Budi", "0812");
        state.set_discount(dec(5000), DiscountType::Nominal).unwrap();
        state.set_cash_received(dec(50000));

        state.complete(TransactionRecord {
            id: "t-1".to_string(),
            transaction_no: "TRX-001".to_string(),
            total: dec(45000),
            payment_method: PaymentMethod::Cash,
            created_at: 0,
        });

        assert_eq!(state.metadata(), &CheckoutMetadata::default());
        assert_eq!(state.cash_received(), Decimal::ZERO);
        assert_eq!(state.last_transaction().unwrap().transaction_no, "TRX-001");
        assert_eq!(state.last_cash_received(), Some(dec(50000)));
    }

    #[test]
    fn test_invalid_discount_keeps_previous() {
        let mut state = CheckoutState::new();
        state.set_discount(dec(10), DiscountType::Percentage).unwrap();
        assert!(state.set_discount(dec(120), DiscountType::Percentage).is_err());
        assert_eq!(state.metadata().discount, dec(10));
    }

    #[test]
    fn test_build_request() {
        let cart = cart_with(12000, 2);
        let mut state = CheckoutState::new();
        state.set_payment_method(PaymentMethod::Transfer);
        state.set_bank_details("BCA", " 123 ");
        state.set_cash_received(dec(99999));

        let request = build_request("b-1", &cart, &state);
        assert_eq!(request.branch_id, "b-1");
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].quantity, 2);
        assert_eq!(request.total, dec(24000));
        assert_eq!(request.cash_received, None);
        assert_eq!(request.bank_name.as_deref(), Some("BCA"));
        assert_eq!(request.reference_no.as_deref(), Some("123"));
        assert_eq!(request.customer_name, None);
    }
}
