//! Branch Selection
//!
//! `NoBranchSelected -> BranchSelected`. Cashiers are pinned to their
//! assigned branch; other roles pick from the active branch list.

use shared::models::{Branch, UserContext};
use tracing::info;

use crate::{PosError, PosResult};

/// Initial branch for a non-pinned user: the persisted branch if still
/// active, else the assigned branch if active, else the first active branch.
/// With no branch list loaded the assigned branch is taken as is.
pub fn resolve_initial_branch(branches: &[Branch], persisted: Option<&str>, assigned: Option<&str>) -> Option<String> {
    let is_active = |id: &str| branches.iter().any(|b| b.is_active && b.id == id);

    persisted
        .filter(|id| is_active(*id))
        .or_else(|| assigned.filter(|id| branches.is_empty() || is_active(*id)))
        .or_else(|| branches.iter().find(|b| b.is_active).map(|b| b.id.as_str()))
        .map(str::to_string)
}

#[derive(Debug, Clone, Default)]
pub struct BranchSelector {
    user: Option<UserContext>,
    branches: Vec<Branch>,
    active: Option<String>,
}

impl BranchSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_user(&mut self, user: UserContext) {
        self.user = Some(user);
    }

    pub fn user(&self) -> Option<&UserContext> {
        self.user.as_ref()
    }

    /// Whether the current user cannot switch branches
    pub fn is_pinned(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.role.is_branch_pinned())
    }

    pub fn set_branches(&mut self, branches: Vec<Branch>) {
        self.branches = branches;
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn active_branch_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Active branch, or [`PosError::NoBranchSelected`]
    pub fn require_active(&self) -> PosResult<&str> {
        self.active_branch_id().ok_or(PosError::NoBranchSelected)
    }

    /// Branch to select when the session starts
    pub fn initial_branch(&self, persisted: Option<&str>) -> Option<String> {
        let assigned = self.user.as_ref().and_then(|u| u.branch_id.as_deref());
        if self.is_pinned() {
            return assigned.map(str::to_string);
        }
        resolve_initial_branch(&self.branches, persisted, assigned)
    }

    /// Switch the active branch. Returns whether it changed.
    ///
    /// Cashiers may only select their assigned branch. When a branch list is
    /// loaded, the target must be an active branch in it.
    pub fn select(&mut self, branch_id: &str) -> PosResult<bool> {
        if self.is_pinned() {
            let assigned = self.user.as_ref().and_then(|u| u.branch_id.as_deref());
            if assigned != Some(branch_id) {
                return Err(PosError::BranchPinned(assigned.unwrap_or_default().to_string()));
            }
        } else if !self.branches.is_empty() {
            match self.branches.iter().find(|b| b.id == branch_id) {
                None => return Err(PosError::BranchNotFound(branch_id.to_string())),
                Some(b) if !b.is_active => return Err(PosError::BranchInactive(branch_id.to_string())),
                Some(_) => {}
            }
        }

        if self.active.as_deref() == Some(branch_id) {
            return Ok(false);
        }

        info!(from = ?self.active, to = %branch_id, "Branch selected");
        self.active = Some(branch_id.to_string());
        Ok(true)
    }
}
