//! User Model

use serde::{Deserialize, Serialize};

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Cashier, pinned to the assigned branch
    Kasir,
    Admin,
    Owner,
    Manager,
    #[serde(other)]
    Other,
}

impl UserRole {
    /// Cashiers cannot switch branches
    pub fn is_branch_pinned(&self) -> bool {
        matches!(self, Self::Kasir)
    }
}

/// Logged-in user as seen by the POS engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub role: UserRole,
    /// Assigned branch
    #[serde(default, alias = "cabangId")]
    pub branch_id: Option<String>,
}

impl UserContext {
    pub fn cashier(branch_id: impl Into<String>) -> Self {
        Self {
            role: UserRole::Kasir,
            branch_id: Some(branch_id.into()),
        }
    }

    pub fn new(role: UserRole, branch_id: Option<String>) -> Self {
        Self { role, branch_id }
    }
}
