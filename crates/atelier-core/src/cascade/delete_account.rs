//! Account deletion: the most involved cascade in the engine.

use crate::{
    cascade::{DeletionReport, IdentityMode, IdentityOutcome, ItemFailure, forbid_self_target},
    error::Error,
    keyspace::{AuditSubject, user_key, user_partition},
    model::{AdminAction, AdminActionKind},
    obs::{self, MetricsEvent, StoreOp},
    store::{Db, contract::StorageBackend, item::item_key},
    types::UserId,
};

impl<B: StorageBackend> Db<B> {
    /// Delete a user account and everything it owns.
    ///
    /// Step order: preconditions fail fast with no side effects; deleting
    /// the profile is the commit point; owned artworks and their pointers
    /// are deleted per-item with failures attributed; the rest of the
    /// user's partition, the object store, and the identity provider are
    /// best-effort; one audit record is written last so it survives the
    /// partition purge.
    pub fn delete_account(
        &self,
        actor: &UserId,
        target: &UserId,
        mode: IdentityMode,
    ) -> Result<DeletionReport, Error> {
        self.require_admin(actor)?;
        forbid_self_target(actor, target)?;
        self.require_profile(target)?;

        // Critical: nothing has been touched before this delete, and
        // nothing after it is allowed to abort the cascade.
        self.guarded_delete(&user_key(target), "user profile")?;

        let mut artworks_deleted: u64 = 0;
        let mut entries_deleted: u64 = 1;
        let mut failures = Vec::new();

        // Critical: owned artworks. Enumeration failure aborts; the set of
        // remaining deletions would be unknown.
        let pointers = self.submission_pointers(target)?;
        for pointer in &pointers {
            match self.delete_artwork_if_exists(&pointer.art_id) {
                Ok(true) => artworks_deleted += 1,
                Ok(false) => {}
                Err(err) => {
                    obs::record(MetricsEvent::CascadeStepFailed { step: "artworks" });
                    failures.push(ItemFailure {
                        id: pointer.art_id.to_string(),
                        reason: err.to_string(),
                    });
                    // Keep the pointer so a re-run can still find the artwork.
                    continue;
                }
            }

            match self.delete_submission_pointer_if_exists(target, &pointer.season_id) {
                Ok(true) => entries_deleted += 1,
                Ok(false) => {}
                Err(err) => {
                    obs::record(MetricsEvent::CascadeStepFailed { step: "artworks" });
                    failures.push(ItemFailure {
                        id: pointer.art_id.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        // Best-effort: donations, vote pointers, stale pointers, old audit
        // rows under the user's partition.
        let (purged, mut purge_failures) = self.purge_user_partition(target);
        entries_deleted += purged;
        failures.append(&mut purge_failures);

        // Best-effort: external artifacts.
        self.scrub_objects(target);

        // Best-effort: identity provider, per the caller's flag.
        let identity = self.resolve_identity(target, mode);

        let action = AdminAction {
            subject: AuditSubject::User(target.clone()),
            actor_id: actor.clone(),
            kind: AdminActionKind::AccountDeleted,
            old_value: None,
            new_value: None,
            detail: Some(format!(
                "artworks_deleted={artworks_deleted} entries_deleted={entries_deleted} identity={}",
                identity.summary()
            )),
            at: self.now(),
            suffix: Some(AdminActionKind::AccountDeleted.to_string()),
        };
        if self.append_admin_action(&action).is_err() {
            obs::record(MetricsEvent::CascadeStepFailed { step: "audit" });
        }

        obs::record(MetricsEvent::RecordsDeleted {
            count: entries_deleted + artworks_deleted,
        });

        Ok(DeletionReport {
            artworks_deleted,
            entries_deleted,
            identity,
            failures,
        })
    }

    /// Batch-delete every record left under the user's partition. Failures
    /// come back per chunk and never abort.
    fn purge_user_partition(&self, user: &UserId) -> (u64, Vec<ItemFailure>) {
        let pk = user_partition(user);
        let items = match self.call(StoreOp::QueryPrefix, || {
            self.backend.query_prefix(&pk, "")
        }) {
            Ok(items) => items,
            Err(err) => {
                obs::record(MetricsEvent::CascadeStepFailed {
                    step: "partition_purge",
                });
                return (
                    0,
                    vec![ItemFailure {
                        id: pk,
                        reason: err.to_string(),
                    }],
                );
            }
        };

        let keys: Vec<_> = items.iter().filter_map(|item| item_key(item).ok()).collect();
        if keys.is_empty() {
            return (0, Vec::new());
        }

        match self.call(StoreOp::BatchDelete, || self.backend.batch_delete(&keys)) {
            Ok(outcome) => {
                let mut failures = Vec::new();
                for chunk in &outcome.failed_chunks {
                    obs::record(MetricsEvent::CascadeStepFailed {
                        step: "partition_purge",
                    });
                    for key in &chunk.keys {
                        failures.push(ItemFailure {
                            id: key.to_string(),
                            reason: chunk.reason.clone(),
                        });
                    }
                }
                (outcome.deleted, failures)
            }
            Err(err) => {
                obs::record(MetricsEvent::CascadeStepFailed {
                    step: "partition_purge",
                });
                (
                    0,
                    vec![ItemFailure {
                        id: pk,
                        reason: err.to_string(),
                    }],
                )
            }
        }
    }

    /// Remove the user's objects from the external object store.
    pub(crate) fn scrub_objects(&self, user: &UserId) {
        let prefix = format!("{user}/");
        let objects = match self.objects.list_objects(&prefix) {
            Ok(objects) => objects,
            Err(_) => {
                obs::record(MetricsEvent::CascadeStepFailed {
                    step: "object_store",
                });
                return;
            }
        };

        if objects.is_empty() {
            return;
        }
        if self.objects.delete_objects(&objects).is_err() {
            obs::record(MetricsEvent::CascadeStepFailed {
                step: "object_store",
            });
        }
    }

    fn resolve_identity(&self, user: &UserId, mode: IdentityMode) -> IdentityOutcome {
        let result = match mode {
            IdentityMode::Disable => self
                .identity
                .disable_account(user.as_str())
                .map(|()| IdentityOutcome::Disabled),
            IdentityMode::Delete => self
                .identity
                .delete_account(user.as_str())
                .map(|()| IdentityOutcome::Deleted),
        };

        result.unwrap_or_else(|err| {
            obs::record(MetricsEvent::CascadeStepFailed { step: "identity" });
            IdentityOutcome::Failed(err.to_string())
        })
    }
}
