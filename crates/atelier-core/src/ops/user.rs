//! Role alteration, ban/unban, and the audit-trail lookup.

use crate::{
    cascade::forbid_self_target,
    error::{Error, ErrorOrigin},
    keyspace::{AuditSubject, user_key},
    model::{
        AdminAction, AdminActionKind, Role, UserProfile,
        user::{ATTR_CAN_SUBMIT, ATTR_ROLE, ATTR_SUBMISSION_QUOTA},
    },
    obs::{self, MetricsEvent},
    store::{Db, contract::{StorageBackend, Update}},
    types::UserId,
};
use serde_json::Value;

///
/// AuditTrail
///
/// A subject's admin actions plus, for user subjects, whatever the
/// identity provider knows about the account. The identity lookup is
/// best-effort; an unreachable provider leaves the field empty.
///

#[derive(Debug)]
pub struct AuditTrail {
    pub actions: Vec<AdminAction>,
    pub identity_attributes: Option<Value>,
}

impl<B: StorageBackend> Db<B> {
    /// Change a user's role, recomputing the per-season submission quota
    /// from the new role in the same write.
    pub fn alter_role(
        &self,
        actor: &UserId,
        target: &UserId,
        new_role: Role,
    ) -> Result<UserProfile, Error> {
        self.require_admin(actor)?;
        forbid_self_target(actor, target)?;
        let mut profile = self.require_profile(target)?;

        if profile.role == new_role {
            return Err(Error::conflict(
                ErrorOrigin::Store,
                format!("user {target} already has role {new_role}"),
            ));
        }

        let old_quota = profile.submission_quota;
        let new_quota = new_role.submission_quota();

        let update = Update::default()
            .set(ATTR_ROLE, new_role.to_string())
            .set(ATTR_SUBMISSION_QUOTA, new_quota);
        self.guarded_update(&user_key(target), update, "user profile")?;

        self.append_admin_action(&AdminAction {
            subject: AuditSubject::User(target.clone()),
            actor_id: actor.clone(),
            kind: AdminActionKind::RoleChanged,
            old_value: Some(old_quota.to_string()),
            new_value: Some(new_quota.to_string()),
            detail: Some(format!("{} -> {new_role}", profile.role)),
            at: self.now(),
            suffix: Some(AdminActionKind::RoleChanged.to_string()),
        })?;

        profile.role = new_role;
        profile.submission_quota = new_quota;
        Ok(profile)
    }

    /// Flip the ban flag. Concurrent calls are last-write-wins; the audit
    /// trail records every attempt, so the outcome stays auditable even
    /// when it is not linearizable.
    pub fn set_ban(
        &self,
        actor: &UserId,
        target: &UserId,
        can_submit: bool,
    ) -> Result<UserProfile, Error> {
        self.require_admin(actor)?;
        forbid_self_target(actor, target)?;
        let mut profile = self.require_profile(target)?;

        let update = Update::default().set(ATTR_CAN_SUBMIT, can_submit);
        self.guarded_update(&user_key(target), update, "user profile")?;

        self.append_admin_action(&AdminAction {
            subject: AuditSubject::User(target.clone()),
            actor_id: actor.clone(),
            kind: AdminActionKind::BanChanged,
            old_value: Some(profile.can_submit.to_string()),
            new_value: Some(can_submit.to_string()),
            detail: None,
            at: self.now(),
            suffix: Some(AdminActionKind::BanChanged.to_string()),
        })?;

        profile.can_submit = can_submit;
        Ok(profile)
    }

    /// Everything on record about a subject: the audit trail plus, for a
    /// user, the identity provider's view of the account.
    pub fn audit_trail(&self, actor: &UserId, subject: &AuditSubject) -> Result<AuditTrail, Error> {
        self.require_admin(actor)?;
        let actions = self.admin_actions(subject)?;

        let identity_attributes = match subject {
            AuditSubject::User(user) => {
                match self.identity.get_account_attributes(user.as_str()) {
                    Ok(attributes) => Some(attributes),
                    Err(_) => {
                        obs::record(MetricsEvent::CascadeStepFailed { step: "identity" });
                        None
                    }
                }
            }
            AuditSubject::Season => None,
        };

        Ok(AuditTrail {
            actions,
            identity_attributes,
        })
    }
}
