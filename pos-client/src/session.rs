//! PosSession - the synchronous state core
//!
//! Owns every in-memory store. All mutations are `&mut self` handlers run
//! one at a time by [`crate::PosEngine`]; no locks are involved.

use shared::message::BusMessage;
use shared::models::{Branch, Product, UserContext};
use shared::sale::{CheckoutRequest, HeldTransaction, TransactionRecord};
use tracing::{debug, error, info, warn};

use crate::branch::BranchSelector;
use crate::cart::CartStore;
use crate::catalog::CatalogCache;
use crate::checkout::{self, CheckoutState, CheckoutSummary};
use crate::held::HeldStore;
use crate::reconcile::{self, CatalogEvent, IgnoreReason, Reconcile};
use crate::storage::{ACTIVE_BRANCH_KEY, ClientStorage};
use crate::{ClientError, ClientResult, PosError, PosResult};

/// Identifies one catalog fetch; a completion whose ticket is no longer
/// current is discarded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub branch_id: String,
    pub generation: u64,
}

/// Result of completing a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Catalog replaced; carries the number of cart lines re-synced
    Replaced { products: usize, cart_lines_synced: usize },
    /// Superseded by a branch change or a newer fetch
    Discarded,
}

#[derive(Debug)]
pub struct PosSession {
    catalog: CatalogCache,
    cart: CartStore,
    held: HeldStore,
    checkout: CheckoutState,
    branch: BranchSelector,
    storage: ClientStorage,
    events_enabled: bool,
    fetch_generation: u64,
    in_flight: Option<FetchTicket>,
}

impl PosSession {
    pub fn new(storage: ClientStorage, stock_versioning: bool) -> Self {
        Self {
            catalog: CatalogCache::new(stock_versioning),
            cart: CartStore::new(),
            held: HeldStore::new(),
            checkout: CheckoutState::new(),
            branch: BranchSelector::new(),
            storage,
            events_enabled: true,
            fetch_generation: 0,
            in_flight: None,
        }
    }

    // ========== Read access ==========

    pub fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub fn held(&self) -> &[HeldTransaction] {
        self.held.list()
    }

    pub fn checkout(&self) -> &CheckoutState {
        &self.checkout
    }

    /// Checkout form fields (customer, payment method, discount, ...)
    pub fn checkout_mut(&mut self) -> &mut CheckoutState {
        &mut self.checkout
    }

    pub fn branches(&self) -> &[Branch] {
        self.branch.branches()
    }

    pub fn active_branch_id(&self) -> Option<&str> {
        self.branch.active_branch_id()
    }

    pub fn user(&self) -> Option<&UserContext> {
        self.branch.user()
    }

    pub fn summary(&self) -> CheckoutSummary {
        CheckoutSummary::compute(&self.cart, self.checkout.metadata())
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    // ========== Cart ==========

    /// Add one unit of a catalog variant, checked against the active
    /// branch's stock
    pub fn add_to_cart(&mut self, variant_id: &str) -> PosResult<i32> {
        let branch_id = self.branch.require_active()?;
        let (product, variant) = self
            .catalog
            .find_variant(variant_id)
            .ok_or_else(|| PosError::VariantNotFound(variant_id.to_string()))?;
        self.cart.add_line(product, variant, variant.stock_at(branch_id))
    }

    pub fn update_quantity(&mut self, variant_id: &str, quantity: i32) -> PosResult<()> {
        self.cart.update_quantity(variant_id, quantity)
    }

    pub fn remove_line(&mut self, variant_id: &str) -> bool {
        self.cart.remove_line(variant_id)
    }

    /// Clear the cart and reset the checkout form
    pub fn reset_transaction(&mut self) {
        self.cart.clear();
        self.checkout.reset();
    }

    // ========== Held transactions ==========

    pub fn hold(&mut self) -> PosResult<i64> {
        self.held.hold(&mut self.cart, &mut self.checkout)
    }

    pub fn retrieve_held(&mut self, id: i64) -> PosResult<()> {
        self.held.retrieve(id, &mut self.cart, &mut self.checkout)
    }

    pub fn discard_held(&mut self, id: i64) -> bool {
        self.held.discard(id)
    }

    // ========== Branch ==========

    pub fn set_user(&mut self, user: UserContext) {
        self.branch.set_user(user);
    }

    pub fn is_branch_pinned(&self) -> bool {
        self.branch.is_pinned()
    }

    pub fn set_branches(&mut self, branches: Vec<Branch>) {
        self.branch.set_branches(branches);
    }

    /// Branch to select on start (persisted, assigned, first active)
    pub fn initial_branch(&self) -> Option<String> {
        self.branch.initial_branch(self.storage.get(ACTIVE_BRANCH_KEY))
    }

    /// Switch branch and persist the choice. Any in-flight fetch becomes
    /// stale. The cart is kept. Returns whether the branch changed.
    pub fn select_branch(&mut self, branch_id: &str) -> PosResult<bool> {
        if !self.branch.select(branch_id)? {
            return Ok(false);
        }

        self.fetch_generation += 1;
        self.in_flight = None;

        if !self.cart.is_empty() {
            warn!(
                branch_id,
                lines = self.cart.lines().len(),
                "Branch changed with a non-empty cart; cached stock belongs to the previous branch"
            );
        }

        if let Err(e) = self.storage.set(ACTIVE_BRANCH_KEY, branch_id) {
            warn!(error = %e, "Failed to persist active branch");
        }
        Ok(true)
    }

    // ========== Catalog fetch ==========

    /// Start a catalog fetch for the active branch
    pub fn begin_fetch(&mut self) -> PosResult<FetchTicket> {
        let branch_id = self.branch.require_active()?.to_string();
        self.fetch_generation += 1;
        let ticket = FetchTicket {
            branch_id,
            generation: self.fetch_generation,
        };
        debug!(branch_id = %ticket.branch_id, generation = ticket.generation, "Catalog fetch started");
        self.in_flight = Some(ticket.clone());
        Ok(ticket)
    }

    /// Finish a fetch. Stale tickets are discarded; a failed fetch leaves
    /// the previous catalog intact.
    pub fn complete_fetch(&mut self, ticket: &FetchTicket, result: ClientResult<Vec<Product>>) -> PosResult<FetchOutcome> {
        if self.in_flight.as_ref() != Some(ticket) {
            warn!(
                branch_id = %ticket.branch_id,
                generation = ticket.generation,
                "Stale catalog response discarded"
            );
            return Ok(FetchOutcome::Discarded);
        }
        self.in_flight = None;

        let products = match result {
            Ok(products) => products,
            Err(e) => {
                error!(branch_id = %ticket.branch_id, error = %e, "Catalog fetch failed");
                return Err(PosError::Network(e));
            }
        };

        self.catalog.replace_all(products);

        // Events dropped during the fetch are covered by the fresh stock
        let branch_id = ticket.branch_id.as_str();
        let mut synced = 0;
        for line in self.cart.lines().to_vec() {
            if let Some(stock) = self.catalog.stock_for(&line.variant_id, branch_id)
                && self.cart.sync_stock(&line.variant_id, stock.quantity, stock.price)
            {
                synced += 1;
            }
        }

        info!(branch_id, products = self.catalog.len(), cart_lines_synced = synced, "Catalog loaded");
        Ok(FetchOutcome::Replaced {
            products: self.catalog.len(),
            cart_lines_synced: synced,
        })
    }

    // ========== Real-time events ==========

    /// Enable or disable the reconciliation channel
    pub fn set_events_enabled(&mut self, enabled: bool) {
        self.events_enabled = enabled;
    }

    /// Whether events would currently be applied
    pub fn accepts_events(&self) -> bool {
        self.events_enabled && self.in_flight.is_none()
    }

    /// Parse and apply a bus message
    pub fn handle_message(&mut self, msg: &BusMessage) -> Reconcile {
        match CatalogEvent::from_bus_message(msg) {
            Ok(Some(event)) => self.handle_event(event),
            Ok(None) => Reconcile::Ignored(IgnoreReason::NotApplicable),
            Err(e) => {
                warn!(request_id = %msg.request_id, error = %e, "Rejected sync message");
                Reconcile::Ignored(IgnoreReason::NotApplicable)
            }
        }
    }

    pub fn handle_event(&mut self, event: CatalogEvent) -> Reconcile {
        if !self.events_enabled {
            return Reconcile::Ignored(IgnoreReason::Disabled);
        }
        if self.in_flight.is_some() {
            debug!(event = event.kind(), "Event dropped during catalog fetch");
            return Reconcile::Ignored(IgnoreReason::FetchInFlight);
        }
        let Some(branch_id) = self.branch.active_branch_id() else {
            return Reconcile::Ignored(IgnoreReason::NoBranchSelected);
        };
        reconcile::apply_event(&mut self.catalog, &mut self.cart, branch_id, event)
    }

    // ========== Checkout ==========

    /// Validate the cart and mark the checkout as processing. Returns the
    /// request to submit.
    pub fn begin_checkout(&mut self) -> PosResult<CheckoutRequest> {
        if self.checkout.is_processing() {
            return Err(PosError::CheckoutInProgress);
        }
        if self.cart.is_empty() {
            return Err(PosError::EmptyCart);
        }
        let branch_id = self.branch.require_active()?;

        let request = checkout::build_request(branch_id, &self.cart, &self.checkout);
        if request.payment_method.is_cash() {
            let received = self.checkout.cash_received();
            if checkout::change_due(request.total, received).is_none() {
                return Err(PosError::InsufficientPayment {
                    total: request.total,
                    received,
                });
            }
        }

        self.checkout.set_processing(true);
        Ok(request)
    }

    /// Apply the submission result. On success the cart is cleared and the
    /// form reset; on failure everything is kept for another attempt.
    pub fn finish_checkout(&mut self, result: ClientResult<TransactionRecord>) -> PosResult<TransactionRecord> {
        self.checkout.set_processing(false);
        match result {
            Ok(record) => {
                info!(transaction_no = %record.transaction_no, total = %record.total, "Checkout completed");
                self.cart.clear();
                self.checkout.complete(record.clone());
                Ok(record)
            }
            Err(ClientError::Api(err)) => {
                warn!(code = %err.code, message = %err.message, "Checkout rejected");
                Err(PosError::CheckoutRejected(err.message))
            }
            Err(e) => {
                error!(error = %e, "Checkout submission failed");
                Err(PosError::Network(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::error::{AppError, ErrorCode};
    use shared::message::{ACTION_UPDATED, RESOURCE_STOCK, StockChange, SyncPayload};
    use shared::models::{ProductKind, ProductVariant, StockRecord, UserRole};
    use shared::sale::PaymentMethod;

    fn catalog() -> Vec<Product> {
        vec![Product {
            id: "p-1".to_string(),
            name: "Kaos Polos".to_string(),
            product_kind: ProductKind::Variant,
            category_id: None,
            variants: vec![ProductVariant {
                id: "v-1".to_string(),
                sku: "KP-M".to_string(),
                variant_name: "Ukuran".to_string(),
                variant_value: "M".to_string(),
                stocks: vec![
                    StockRecord::new("b-1", 5, Decimal::from(50000)),
                    StockRecord::new("b-2", 1, Decimal::from(52000)),
                ],
            }],
        }]
    }

    fn session() -> PosSession {
        let mut session = PosSession::new(ClientStorage::in_memory(), true);
        session.set_user(UserContext::new(UserRole::Admin, Some("b-1".to_string())));
        session.select_branch("b-1").unwrap();
        let ticket = session.begin_fetch().unwrap();
        session.complete_fetch(&ticket, Ok(catalog())).unwrap();
        session
    }

    fn stock_event(branch_id: &str, quantity: i32, version: Option<u64>) -> CatalogEvent {
        CatalogEvent::StockUpdated {
            change: StockChange {
                branch_id: branch_id.to_string(),
                variant_id: "v-1".to_string(),
                quantity,
                price: Decimal::from(50000),
            },
            version,
        }
    }

    #[test]
    fn test_add_requires_branch_and_known_variant() {
        let mut empty = PosSession::new(ClientStorage::in_memory(), true);
        assert!(matches!(empty.add_to_cart("v-1"), Err(PosError::NoBranchSelected)));

        let mut session = session();
        assert!(matches!(session.add_to_cart("v-404"), Err(PosError::VariantNotFound(_))));
        assert_eq!(session.add_to_cart("v-1").unwrap(), 1);
    }

    #[test]
    fn test_stock_drop_leaves_line_oversold() {
        let mut session = session();
        session.add_to_cart("v-1").unwrap();
        session.update_quantity("v-1", 2).unwrap();

        let outcome = session.handle_event(stock_event("b-1", 1, None));
        assert_eq!(outcome, Reconcile::Applied { cart_lines_synced: 1 });

        let line = session.cart().line_for("v-1").unwrap();
        assert_eq!(line.cached_available_stock, 1);
        assert_eq!(line.quantity, 2);
        assert_eq!(session.cart().oversold_lines().len(), 1);
    }

    #[test]
    fn test_other_branch_events_ignored() {
        let mut session = session();
        session.add_to_cart("v-1").unwrap();

        let outcome = session.handle_event(stock_event("b-2", 0, None));
        assert_eq!(outcome, Reconcile::Ignored(IgnoreReason::OtherBranch));
        assert_eq!(session.catalog().stock_for("v-1", "b-2").unwrap().quantity, 1);
        assert_eq!(session.cart().line_for("v-1").unwrap().cached_available_stock, 5);
    }

    fn updated_product(stocks: Vec<StockRecord>) -> CatalogEvent {
        let mut product = catalog().remove(0);
        product.name = "Kaos Polos Premium".to_string();
        product.variants[0].stocks = stocks;
        CatalogEvent::ProductUpdated(Box::new(product))
    }

    #[test]
    fn test_product_update_syncs_active_branch_lines() {
        let mut session = session();
        session.add_to_cart("v-1").unwrap();

        let outcome = session.handle_event(updated_product(vec![
            StockRecord::new("b-1", 3, Decimal::from(48000)),
            StockRecord::new("b-2", 0, Decimal::from(52000)),
        ]));
        assert_eq!(outcome, Reconcile::Applied { cart_lines_synced: 1 });

        let line = session.cart().line_for("v-1").unwrap();
        assert_eq!(line.cached_available_stock, 3);
        assert_eq!(line.unit_price, Decimal::from(48000));
        assert_eq!(session.catalog().products()[0].name, "Kaos Polos Premium");
        assert_eq!(session.catalog().stock_for("v-1", "b-2").unwrap().quantity, 0);
    }

    #[test]
    fn test_product_update_without_active_branch_stock() {
        let mut session = session();
        session.add_to_cart("v-1").unwrap();

        let outcome = session.handle_event(updated_product(vec![StockRecord::new("b-2", 7, Decimal::from(52000))]));
        assert_eq!(outcome, Reconcile::Applied { cart_lines_synced: 0 });

        let line = session.cart().line_for("v-1").unwrap();
        assert_eq!(line.cached_available_stock, 5);
        assert_eq!(line.unit_price, Decimal::from(50000));
        assert_eq!(session.catalog().stock_for("v-1", "b-2").unwrap().quantity, 7);
    }

    #[test]
    fn test_product_delete_keeps_cart_lines() {
        let mut session = session();
        session.add_to_cart("v-1").unwrap();

        let outcome = session.handle_event(CatalogEvent::ProductDeleted("p-1".to_string()));
        assert_eq!(outcome, Reconcile::Applied { cart_lines_synced: 0 });
        assert!(session.catalog().is_empty());
        assert_eq!(session.cart().item_count(), 1);
        assert_eq!(session.cart().line_for("v-1").unwrap().cached_available_stock, 5);
    }

    #[test]
    fn test_stock_push_reaches_line_of_deleted_product() {
        let mut session = session();
        session.add_to_cart("v-1").unwrap();
        session.handle_event(CatalogEvent::ProductDeleted("p-1".to_string()));

        let event = CatalogEvent::StockUpdated {
            change: StockChange {
                branch_id: "b-1".to_string(),
                variant_id: "v-1".to_string(),
                quantity: 0,
                price: Decimal::ONE,
            },
            version: None,
        };
        assert_eq!(session.handle_event(event), Reconcile::Applied { cart_lines_synced: 1 });

        let line = session.cart().line_for("v-1").unwrap();
        assert_eq!(line.cached_available_stock, 0);
        assert_eq!(line.unit_price, Decimal::ONE);
        assert!(session.catalog().is_empty());

        // not in the cart either
        let mut unknown = stock_event("b-1", 4, None);
        if let CatalogEvent::StockUpdated { change, .. } = &mut unknown {
            change.variant_id = "v-404".to_string();
        }
        assert_eq!(session.handle_event(unknown), Reconcile::Ignored(IgnoreReason::UnknownVariant));
    }

    #[test]
    fn test_events_dropped_while_fetching() {
        let mut session = session();
        let ticket = session.begin_fetch().unwrap();
        assert!(!session.accepts_events());

        let outcome = session.handle_event(stock_event("b-1", 0, None));
        assert_eq!(outcome, Reconcile::Ignored(IgnoreReason::FetchInFlight));
        assert_eq!(session.catalog().stock_for("v-1", "b-1").unwrap().quantity, 5);

        session.complete_fetch(&ticket, Ok(catalog())).unwrap();
        assert!(session.accepts_events());
    }

    #[test]
    fn test_disabled_channel() {
        let mut session = session();
        session.set_events_enabled(false);
        assert_eq!(
            session.handle_event(stock_event("b-1", 0, None)),
            Reconcile::Ignored(IgnoreReason::Disabled)
        );
    }

    #[test]
    fn test_handle_message_rejects_malformed() {
        let mut session = session();
        let payload = SyncPayload::new(RESOURCE_STOCK, ACTION_UPDATED, "v-1");
        let msg = BusMessage::sync(&payload).unwrap();
        assert_eq!(session.handle_message(&msg), Reconcile::Ignored(IgnoreReason::NotApplicable));
        assert_eq!(session.catalog().stock_for("v-1", "b-1").unwrap().quantity, 5);
    }

    #[test]
    fn test_late_fetch_for_previous_branch_discarded() {
        let mut session = session();
        let ticket = session.begin_fetch().unwrap();

        session.select_branch("b-2").unwrap();
        let mut late = catalog();
        late[0].variants[0].stocks[0].quantity = 99;
        assert_eq!(session.complete_fetch(&ticket, Ok(late)).unwrap(), FetchOutcome::Discarded);
        assert_eq!(session.catalog().stock_for("v-1", "b-1").unwrap().quantity, 5);
    }

    #[test]
    fn test_newer_fetch_supersedes_older() {
        let mut session = session();
        let first = session.begin_fetch().unwrap();
        let second = session.begin_fetch().unwrap();

        assert_eq!(session.complete_fetch(&first, Ok(vec![])).unwrap(), FetchOutcome::Discarded);
        assert_eq!(session.catalog().len(), 1);
        assert!(matches!(
            session.complete_fetch(&second, Ok(catalog())).unwrap(),
            FetchOutcome::Replaced { products: 1, .. }
        ));
    }

    #[test]
    fn test_failed_fetch_keeps_catalog() {
        let mut session = session();
        let ticket = session.begin_fetch().unwrap();
        let err = session
            .complete_fetch(&ticket, Err(ClientError::Internal("down".to_string())))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NetworkError);
        assert_eq!(session.catalog().len(), 1);
        assert!(!session.is_fetching());
    }

    #[test]
    fn test_fetch_resyncs_cart() {
        let mut session = session();
        session.add_to_cart("v-1").unwrap();

        let ticket = session.begin_fetch().unwrap();
        let mut fresh = catalog();
        fresh[0].variants[0].stocks[0].quantity = 2;
        let outcome = session.complete_fetch(&ticket, Ok(fresh)).unwrap();

        assert_eq!(outcome, FetchOutcome::Replaced { products: 1, cart_lines_synced: 1 });
        assert_eq!(session.cart().line_for("v-1").unwrap().cached_available_stock, 2);
    }

    #[test]
    fn test_branch_switch_keeps_cart_and_persists() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut session = PosSession::new(ClientStorage::load(dir.path()).unwrap(), true);
        session.set_user(UserContext::new(UserRole::Manager, None));
        session.select_branch("b-1").unwrap();
        let ticket = session.begin_fetch().unwrap();
        session.complete_fetch(&ticket, Ok(catalog())).unwrap();
        session.add_to_cart("v-1").unwrap();

        assert!(session.select_branch("b-2").unwrap());
        assert_eq!(session.cart().item_count(), 1);

        let storage = ClientStorage::load(dir.path()).unwrap();
        assert_eq!(storage.get(ACTIVE_BRANCH_KEY), Some("b-2"));
    }

    #[test]
    fn test_checkout_success_resets() {
        let mut session = session();
        session.add_to_cart("v-1").unwrap();
        session.checkout_mut().set_cash_received(Decimal::from(60000));

        let request = session.begin_checkout().unwrap();
        assert_eq!(request.total, Decimal::from(50000));
        assert!(session.checkout().is_processing());
        assert!(matches!(session.begin_checkout(), Err(PosError::CheckoutInProgress)));

        let record = TransactionRecord {
            id: "t-1".to_string(),
            transaction_no: "TRX-0001".to_string(),
            total: request.total,
            payment_method: PaymentMethod::Cash,
            created_at: 0,
        };
        session.finish_checkout(Ok(record)).unwrap();

        assert!(session.cart().is_empty());
        assert!(!session.checkout().is_processing());
        assert_eq!(session.checkout().last_cash_received(), Some(Decimal::from(60000)));
        assert_eq!(session.checkout().last_transaction().unwrap().transaction_no, "TRX-0001");
    }

    #[test]
    fn test_checkout_rejection_keeps_cart() {
        let mut session = session();
        session.add_to_cart("v-1").unwrap();
        session.checkout_mut().set_payment_method(PaymentMethod::Qris);

        session.begin_checkout().unwrap();
        let rejection = AppError::with_message(ErrorCode::InsufficientStock, "Stok tidak mencukupi");
        let err = session.finish_checkout(Err(ClientError::Api(rejection))).unwrap_err();

        assert!(matches!(err, PosError::CheckoutRejected(ref msg) if msg == "Stok tidak mencukupi"));
        assert_eq!(session.cart().item_count(), 1);
        assert_eq!(session.checkout().metadata().payment_method, PaymentMethod::Qris);
        assert!(!session.checkout().is_processing());
    }

    #[test]
    fn test_checkout_guards() {
        let mut session = session();
        assert!(matches!(session.begin_checkout(), Err(PosError::EmptyCart)));

        session.add_to_cart("v-1").unwrap();
        session.checkout_mut().set_cash_received(Decimal::from(10000));
        assert!(matches!(
            session.begin_checkout(),
            Err(PosError::InsufficientPayment { .. })
        ));
        assert!(!session.checkout().is_processing());
    }
}
