use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==================== Resources ====================

/// Sync resource: a whole product (created / updated / deleted)
pub const RESOURCE_PRODUCT: &str = "product";
/// Sync resource: one variant's stock at one branch
pub const RESOURCE_STOCK: &str = "stock";
/// Sync resource: the catalog as a whole (refresh signal)
pub const RESOURCE_CATALOG: &str = "catalog";

pub const ACTION_CREATED: &str = "created";
pub const ACTION_UPDATED: &str = "updated";
pub const ACTION_DELETED: &str = "deleted";
pub const ACTION_REFRESH: &str = "refresh";

// ==================== Notification Level ====================

/// Notification level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// ==================== Payloads ====================

/// Notification payload (server -> clients)
///
/// Informational only; it never touches catalog or cart state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub message: String,
    pub level: NotificationLevel,
}

impl NotificationPayload {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            level: NotificationLevel::Info,
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            level: NotificationLevel::Warning,
        }
    }
}

/// Sync signal payload (server -> all clients)
///
/// Broadcast whenever a catalog resource changes, whichever terminal caused it.
///
/// # Examples
/// - `resource`: "stock", `action`: "updated", `id`: variant id,
///   `data`: a [`StockChange`], `version`: 42
/// - `resource`: "product", `action`: "deleted", `id`: product id
/// - `resource`: "catalog", `action`: "refresh"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPayload {
    /// Resource type ("product", "stock", "catalog")
    pub resource: String,
    /// Monotonic version per resource key, when the server provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// Change type ("created", "updated", "deleted", "refresh")
    pub action: String,
    /// Resource id (empty for catalog-wide signals)
    #[serde(default)]
    pub id: String,
    /// Resource data (None for deletes and refresh signals)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl SyncPayload {
    pub fn new(resource: &str, action: &str, id: impl Into<String>) -> Self {
        Self {
            resource: resource.to_string(),
            version: None,
            action: action.to_string(),
            id: id.into(),
            data: None,
        }
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_data<T: Serialize>(mut self, data: &T) -> Result<Self, serde_json::Error> {
        self.data = Some(serde_json::to_value(data)?);
        Ok(self)
    }
}

/// Stock change pushed for one variant at one branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockChange {
    #[serde(alias = "cabangId")]
    pub branch_id: String,
    #[serde(alias = "productVariantId")]
    pub variant_id: String,
    pub quantity: i32,
    #[serde(default)]
    pub price: Decimal,
}
