//! Stock Reconciliation Channel
//!
//! Turns sync signals from the message bus into typed [`CatalogEvent`]s and
//! applies them to the catalog cache and the active cart.

use shared::message::{
    ACTION_CREATED, ACTION_DELETED, ACTION_UPDATED, BusMessage, EventType, RESOURCE_CATALOG, RESOURCE_PRODUCT,
    RESOURCE_STOCK, StockChange, SyncPayload,
};
use shared::models::Product;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cart::CartStore;
use crate::catalog::{CatalogCache, StockApply};

/// Catalog change pushed by the server
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEvent {
    /// A product was created somewhere; the full catalog is re-fetched
    ProductCreated,
    ProductUpdated(Box<Product>),
    ProductDeleted(String),
    StockUpdated {
        change: StockChange,
        version: Option<u64>,
    },
    /// The server asks clients to re-fetch everything
    RefreshNeeded,
}

/// Sync payload that could not be turned into a [`CatalogEvent`]
#[derive(Debug, Error)]
pub enum EventParseError {
    #[error("Malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Unknown action '{action}' for resource '{resource}'")]
    UnknownAction { resource: String, action: String },

    #[error("Missing data for {0} event")]
    MissingData(String),

    #[error("Missing id for {0} event")]
    MissingId(String),
}

impl CatalogEvent {
    /// Parse a bus message. `Ok(None)` means the message is not a catalog
    /// sync signal (other event types or resources).
    pub fn from_bus_message(msg: &BusMessage) -> Result<Option<Self>, EventParseError> {
        if msg.event_type != EventType::Sync {
            return Ok(None);
        }
        let payload: SyncPayload = msg.parse_payload()?;
        Self::from_sync_payload(payload)
    }

    pub fn from_sync_payload(payload: SyncPayload) -> Result<Option<Self>, EventParseError> {
        let SyncPayload {
            resource,
            version,
            action,
            id,
            data,
        } = payload;

        let event = match (resource.as_str(), action.as_str()) {
            (RESOURCE_CATALOG, _) => Self::RefreshNeeded,
            (RESOURCE_PRODUCT, ACTION_CREATED) => Self::ProductCreated,
            (RESOURCE_PRODUCT, ACTION_UPDATED) => {
                let data = data.ok_or_else(|| EventParseError::MissingData(resource.clone()))?;
                Self::ProductUpdated(Box::new(serde_json::from_value(data)?))
            }
            (RESOURCE_PRODUCT, ACTION_DELETED) => {
                if id.is_empty() {
                    return Err(EventParseError::MissingId(resource));
                }
                Self::ProductDeleted(id)
            }
            (RESOURCE_STOCK, ACTION_UPDATED) => {
                let data = data.ok_or_else(|| EventParseError::MissingData(resource.clone()))?;
                Self::StockUpdated {
                    change: serde_json::from_value(data)?,
                    version,
                }
            }
            (RESOURCE_PRODUCT | RESOURCE_STOCK, _) => {
                return Err(EventParseError::UnknownAction { resource, action });
            }
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProductCreated => "product_created",
            Self::ProductUpdated(_) => "product_updated",
            Self::ProductDeleted(_) => "product_deleted",
            Self::StockUpdated { .. } => "stock_updated",
            Self::RefreshNeeded => "refresh_needed",
        }
    }
}

/// What applying an event did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconcile {
    /// Cache (and possibly cart) updated; carries the number of cart lines synced
    Applied { cart_lines_synced: usize },
    /// The caller must re-fetch the catalog for the active branch
    Refetch,
    /// Nothing changed
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Channel disabled
    Disabled,
    /// A full fetch is in flight and supersedes the event
    FetchInFlight,
    NoBranchSelected,
    OtherBranch,
    StaleVersion,
    UnknownVariant,
    /// Not a catalog signal, or unparseable
    NotApplicable,
}

/// Apply an event to the cache and cart for the active branch
pub fn apply_event(catalog: &mut CatalogCache, cart: &mut CartStore, active_branch: &str, event: CatalogEvent) -> Reconcile {
    match event {
        CatalogEvent::ProductCreated | CatalogEvent::RefreshNeeded => {
            info!(event = event.kind(), "Catalog refetch requested");
            Reconcile::Refetch
        }
        CatalogEvent::ProductUpdated(product) => {
            let synced = product
                .variants
                .iter()
                .filter_map(|v| v.stock_at(active_branch).map(|s| (v.id.as_str(), s)))
                .filter(|(variant_id, stock)| cart.sync_stock(variant_id, stock.quantity, stock.price))
                .count();
            debug!(product_id = %product.id, cart_lines_synced = synced, "Product updated");
            catalog.upsert_product(*product);
            Reconcile::Applied {
                cart_lines_synced: synced,
            }
        }
        CatalogEvent::ProductDeleted(product_id) => {
            // Cart lines referencing the product stay until the cashier removes them
            let removed = catalog.remove_product(&product_id);
            debug!(product_id = %product_id, removed, "Product deleted");
            Reconcile::Applied { cart_lines_synced: 0 }
        }
        CatalogEvent::StockUpdated { change, version } => {
            if change.branch_id != active_branch {
                debug!(branch_id = %change.branch_id, variant_id = %change.variant_id, "Stock event for another branch ignored");
                return Reconcile::Ignored(IgnoreReason::OtherBranch);
            }
            match catalog.apply_stock_change(&change, version) {
                StockApply::Applied => {
                    let synced = cart.sync_stock(&change.variant_id, change.quantity, change.price);
                    debug!(
                        variant_id = %change.variant_id,
                        quantity = change.quantity,
                        version = ?version,
                        in_cart = synced,
                        "Stock updated"
                    );
                    Reconcile::Applied {
                        cart_lines_synced: usize::from(synced),
                    }
                }
                StockApply::Stale { current } => {
                    warn!(variant_id = %change.variant_id, version = ?version, current, "Stale stock event discarded");
                    Reconcile::Ignored(IgnoreReason::StaleVersion)
                }
                StockApply::UnknownVariant => {
                    // Lines of a deleted product stay in the cart and still track stock
                    if cart.sync_stock(&change.variant_id, change.quantity, change.price) {
                        debug!(variant_id = %change.variant_id, quantity = change.quantity, "Stock synced for uncatalogued cart line");
                        Reconcile::Applied { cart_lines_synced: 1 }
                    } else {
                        debug!(variant_id = %change.variant_id, "Stock event for unknown variant ignored");
                        Reconcile::Ignored(IgnoreReason::UnknownVariant)
                    }
                }
            }
        }
    }
}
