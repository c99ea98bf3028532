//! Cascading mutation engine.
//!
//! Multi-record operations where one logical action touches several
//! partitions. Critical steps run sequentially and abort the operation on
//! failure; best-effort steps capture their failures into the returned
//! report and never abort. Nothing is rolled back: every step is
//! idempotent, so re-running an interrupted operation converges.

pub mod delete_account;
pub mod remove_artworks;

use crate::{
    error::Error,
    model::{Role, UserProfile},
    store::{Db, contract::StorageBackend},
    types::UserId,
};

///
/// ItemFailure
///
/// One record a best-effort or per-item step could not delete, attributed
/// so a caller can retry just the failed subset.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ItemFailure {
    pub id: String,
    pub reason: String,
}

///
/// IdentityMode
///
/// Caller-selected treatment of the identity-provider account during
/// account deletion: soft-disable or hard-delete.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IdentityMode {
    Disable,
    Delete,
}

///
/// IdentityOutcome
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IdentityOutcome {
    Disabled,
    Deleted,
    Failed(String),
}

impl IdentityOutcome {
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Disabled => "disabled".to_string(),
            Self::Deleted => "deleted".to_string(),
            Self::Failed(reason) => format!("failed ({reason})"),
        }
    }
}

///
/// DeletionReport
///
/// Structured outcome of an account deletion. `entries_deleted` counts the
/// profile, submission pointers, and every other record purged from the
/// user's partition; artworks are counted separately because they live in
/// their own partitions.
///

#[derive(Debug)]
pub struct DeletionReport {
    pub artworks_deleted: u64,
    pub entries_deleted: u64,
    pub identity: IdentityOutcome,
    pub failures: Vec<ItemFailure>,
}

///
/// RemovalReport
///

#[derive(Debug)]
pub struct RemovalReport {
    pub removed: u64,
    pub total: u64,
    pub failed: Vec<ItemFailure>,
}

impl<B: StorageBackend> Db<B> {
    /// Load the actor's profile and require the admin role.
    pub(crate) fn require_admin(&self, actor: &UserId) -> Result<UserProfile, Error> {
        let profile = self.require_profile(actor)?;
        if profile.role == Role::Admin {
            Ok(profile)
        } else {
            Err(Error::authorization(format!(
                "user {actor} is not an administrator"
            )))
        }
    }
}

/// An actor may not delete, ban, or otherwise modify itself.
pub(crate) fn forbid_self_target(actor: &UserId, target: &UserId) -> Result<(), Error> {
    if actor == target {
        Err(Error::authorization(format!(
            "user {actor} may not target itself"
        )))
    } else {
        Ok(())
    }
}
