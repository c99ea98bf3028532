//! Bulk artwork removal: the deletion cascade restricted to owned records.

use crate::{
    cascade::{ItemFailure, RemovalReport},
    error::Error,
    keyspace::AuditSubject,
    model::{AdminAction, AdminActionKind},
    obs::{self, MetricsEvent},
    store::{Db, contract::StorageBackend},
    types::UserId,
};

impl<B: StorageBackend> Db<B> {
    /// Remove every artwork a user has submitted, keeping the account.
    ///
    /// Per-item failures are captured and returned so a caller can retry
    /// only the failed subset; a failed artwork keeps its submission
    /// pointer, so a re-run finds it again.
    pub fn remove_artworks(&self, actor: &UserId, target: &UserId) -> Result<RemovalReport, Error> {
        self.require_admin(actor)?;
        self.require_profile(target)?;

        let pointers = self.submission_pointers(target)?;
        #[allow(clippy::cast_possible_truncation)]
        let total = pointers.len() as u64;

        let mut removed: u64 = 0;
        let mut failed = Vec::new();

        for pointer in &pointers {
            match self.delete_artwork_if_exists(&pointer.art_id) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(err) => {
                    obs::record(MetricsEvent::CascadeStepFailed { step: "artworks" });
                    failed.push(ItemFailure {
                        id: pointer.art_id.to_string(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            }

            if let Err(err) = self.delete_submission_pointer_if_exists(target, &pointer.season_id)
            {
                obs::record(MetricsEvent::CascadeStepFailed { step: "artworks" });
                failed.push(ItemFailure {
                    id: pointer.art_id.to_string(),
                    reason: err.to_string(),
                });
            }
        }

        // Best-effort: external artifacts of the removed artworks.
        self.scrub_objects(target);

        let action = AdminAction {
            subject: AuditSubject::User(target.clone()),
            actor_id: actor.clone(),
            kind: AdminActionKind::ArtworksRemoved,
            old_value: None,
            new_value: None,
            detail: Some(format!("removed={removed} total={total}")),
            at: self.now(),
            suffix: Some(AdminActionKind::ArtworksRemoved.to_string()),
        };
        if self.append_admin_action(&action).is_err() {
            obs::record(MetricsEvent::CascadeStepFailed { step: "audit" });
        }

        obs::record(MetricsEvent::RecordsDeleted { count: removed });

        Ok(RemovalReport {
            removed,
            total,
            failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{Artwork, Role, SubmissionPointer, UserProfile},
        store::{memory::MemoryBackend, retry::RetryPolicy},
        test_support::TickingClock,
        types::{ArtId, SeasonId, Timestamp},
    };
    use std::sync::Arc;
    use ulid::Ulid;

    fn admin() -> UserId {
        UserId::new("auth0|admin").expect("valid id")
    }

    fn target() -> UserId {
        UserId::new("auth0|alice").expect("valid id")
    }

    fn db() -> Db<MemoryBackend> {
        Db::new(MemoryBackend::new())
            .with_retry(RetryPolicy::immediate())
            .with_clock(Arc::new(TickingClock::starting_at(1_764_588_000_000)))
    }

    fn seed(db: &Db<MemoryBackend>, count: u128) {
        db.create_profile(&UserProfile::new(admin(), Role::Admin))
            .expect("seed admin");
        db.create_profile(&UserProfile::new(target(), Role::Contributor))
            .expect("seed target");

        for n in 1..=count {
            let season = SeasonId::from_ulid(Ulid::from_parts(1_700_000_000_000, n));
            let art = ArtId::from_ulid(Ulid::from_parts(1_700_000_100_000, n));
            db.put_artwork_if_absent(&Artwork {
                art_id: art,
                user_id: target(),
                season_id: season,
                title: format!("Piece {n}"),
                votes: 0,
                approved: true,
                submitted_at: Timestamp::from_unix_millis(1_764_587_000_000),
            })
            .expect("seed artwork");
            db.put_submission_pointer_if_absent(&SubmissionPointer {
                user_id: target(),
                season_id: season,
                art_id: art,
                submitted_at: Timestamp::from_unix_millis(1_764_587_000_000),
            })
            .expect("seed pointer");
        }
    }

    #[test]
    fn removal_clears_artworks_and_pointers() {
        let db = db();
        seed(&db, 3);

        let report = db.remove_artworks(&admin(), &target()).expect("removal");
        assert_eq!(report.removed, 3);
        assert_eq!(report.total, 3);
        assert!(report.failed.is_empty());

        assert!(db.submission_pointers(&target()).expect("list").is_empty());
        // The account itself is untouched.
        assert!(db.get_profile(&target()).expect("get").is_some());
    }

    #[test]
    fn removal_is_idempotent() {
        let db = db();
        seed(&db, 2);

        db.remove_artworks(&admin(), &target()).expect("first run");
        let report = db.remove_artworks(&admin(), &target()).expect("second run");
        assert_eq!(report.removed, 0);
        assert_eq!(report.total, 0);
    }

    #[test]
    fn removal_writes_an_audit_record() {
        let db = db();
        seed(&db, 1);

        db.remove_artworks(&admin(), &target()).expect("removal");
        let trail = db
            .admin_actions(&AuditSubject::User(target()))
            .expect("list");
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].kind, AdminActionKind::ArtworksRemoved);
        assert_eq!(trail[0].detail.as_deref(), Some("removed=1 total=1"));
    }
}
