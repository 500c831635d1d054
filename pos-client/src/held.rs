//! Held-Transaction Store
//!
//! Parks the active cart (with its checkout form) so another customer can be
//! served. Retrieval moves the snapshot back and forgets it.

use shared::sale::HeldTransaction;
use shared::util::{now_millis, snowflake_id};
use tracing::{info, warn};

use crate::cart::CartStore;
use crate::checkout::CheckoutState;
use crate::{PosError, PosResult};

#[derive(Debug, Clone, Default)]
pub struct HeldStore {
    held: Vec<HeldTransaction>,
}

impl HeldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park the active cart and checkout form; both are reset afterwards.
    /// Returns the new held id.
    pub fn hold(&mut self, cart: &mut CartStore, checkout: &mut CheckoutState) -> PosResult<i64> {
        if cart.is_empty() {
            return Err(PosError::EmptyCart);
        }

        let id = self.fresh_id();
        let held = HeldTransaction::new(id, cart.take_lines(), checkout.metadata().clone(), now_millis());
        info!(held_id = id, items = held.item_count(), "Transaction held");

        self.held.push(held);
        checkout.reset();
        Ok(id)
    }

    /// Restore a held transaction into the active cart and checkout form,
    /// removing it from the store. The active cart is replaced.
    pub fn retrieve(&mut self, id: i64, cart: &mut CartStore, checkout: &mut CheckoutState) -> PosResult<()> {
        let Some(index) = self.held.iter().position(|h| h.id == id) else {
            return Err(PosError::HeldNotFound(id));
        };
        let held = self.held.remove(index);

        if !cart.is_empty() {
            warn!(held_id = id, replaced_lines = cart.lines().len(), "Active cart replaced by held transaction");
        }
        cart.restore_lines(held.lines);
        checkout.restore(held.metadata);
        info!(held_id = id, "Held transaction retrieved");
        Ok(())
    }

    /// Drop a held transaction without restoring it
    pub fn discard(&mut self, id: i64) -> bool {
        let before = self.held.len();
        self.held.retain(|h| h.id != id);
        self.held.len() != before
    }

    pub fn get(&self, id: i64) -> Option<&HeldTransaction> {
        self.held.iter().find(|h| h.id == id)
    }

    /// Held transactions in hold order
    pub fn list(&self) -> &[HeldTransaction] {
        &self.held
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    fn fresh_id(&self) -> i64 {
        loop {
            let id = snowflake_id();
            if self.get(id).is_none() {
                return id;
            }
        }
    }
}
