//! Donation recording and settlement.

use crate::{
    error::{Error, ErrorOrigin},
    keyspace::AuditSubject,
    model::{AdminAction, AdminActionKind, Donation, DonationStatus},
    store::{Db, contract::StorageBackend},
    types::{DonationId, UserId},
};

impl<B: StorageBackend> Db<B> {
    /// Record a pending donation. Donations are append-only; a duplicate
    /// donation id is a conflict, never an overwrite.
    pub fn record_donation(
        &self,
        user: &UserId,
        donation_id: DonationId,
        amount_minor: u64,
        currency: impl Into<String>,
    ) -> Result<Donation, Error> {
        if amount_minor == 0 {
            return Err(Error::validation(
                ErrorOrigin::Store,
                "donation amount must be positive",
            ));
        }
        let currency = currency.into();
        if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(Error::validation(
                ErrorOrigin::Store,
                format!("currency must be a three-letter uppercase code, got {currency:?}"),
            ));
        }

        self.require_profile(user)?;

        let donation = Donation {
            user_id: user.clone(),
            donation_id,
            amount_minor,
            currency,
            status: DonationStatus::Pending,
            donated_at: self.now(),
        };
        self.put_donation_if_absent(&donation)?;

        Ok(donation)
    }

    /// Settle a pending donation. The pending status is re-checked in the
    /// conditional write, so a double settlement loses with `Gone` instead
    /// of silently re-completing.
    pub fn complete_donation(
        &self,
        user: &UserId,
        donation_id: &DonationId,
    ) -> Result<Donation, Error> {
        let mut donation = self.require_donation(user, donation_id)?;
        if donation.status != DonationStatus::Pending {
            return Err(Error::conflict(
                ErrorOrigin::Store,
                format!("donation {donation_id} is already {}", donation.status),
            ));
        }

        self.transition_donation_status(
            user,
            donation_id,
            DonationStatus::Pending,
            DonationStatus::Completed,
        )?;

        self.append_admin_action(&AdminAction {
            subject: AuditSubject::User(user.clone()),
            actor_id: user.clone(),
            kind: AdminActionKind::DonationCompleted,
            old_value: Some(DonationStatus::Pending.to_string()),
            new_value: Some(DonationStatus::Completed.to_string()),
            detail: Some(format!(
                "donation={donation_id} amount_minor={} currency={}",
                donation.amount_minor, donation.currency
            )),
            at: self.now(),
            suffix: Some(AdminActionKind::DonationCompleted.to_string()),
        })?;

        donation.status = DonationStatus::Completed;
        Ok(donation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{Role, UserProfile},
        store::{memory::MemoryBackend, retry::RetryPolicy},
        test_support::TickingClock,
    };
    use std::sync::Arc;
    use ulid::Ulid;

    fn user() -> UserId {
        UserId::new("auth0|alice").expect("valid id")
    }

    fn donation_id() -> DonationId {
        DonationId::from_ulid(Ulid::from_parts(1_700_000_200_000, 1))
    }

    fn db() -> Db<MemoryBackend> {
        let db = Db::new(MemoryBackend::new())
            .with_retry(RetryPolicy::immediate())
            .with_clock(Arc::new(TickingClock::starting_at(1_764_588_000_000)));
        db.create_profile(&UserProfile::new(user(), Role::User))
            .expect("seed user");
        db
    }

    #[test]
    fn a_donation_starts_pending() {
        let db = db();
        let donation = db
            .record_donation(&user(), donation_id(), 2_500, "EUR")
            .expect("record");
        assert_eq!(donation.status, DonationStatus::Pending);
        assert_eq!(db.donations(&user()).expect("list").len(), 1);
    }

    #[test]
    fn malformed_input_is_rejected_before_any_write() {
        let db = db();

        let err = db
            .record_donation(&user(), donation_id(), 0, "EUR")
            .expect_err("zero amount");
        assert!(err.is_validation());

        let err = db
            .record_donation(&user(), donation_id(), 100, "eur")
            .expect_err("lowercase currency");
        assert!(err.is_validation());

        assert!(db.donations(&user()).expect("list").is_empty());
    }

    #[test]
    fn completing_twice_is_a_conflict() {
        let db = db();
        db.record_donation(&user(), donation_id(), 2_500, "EUR")
            .expect("record");

        let settled = db
            .complete_donation(&user(), &donation_id())
            .expect("settle");
        assert_eq!(settled.status, DonationStatus::Completed);

        let err = db
            .complete_donation(&user(), &donation_id())
            .expect_err("already settled");
        assert!(err.is_conflict());
    }

    #[test]
    fn settlement_leaves_an_audit_record() {
        let db = db();
        db.record_donation(&user(), donation_id(), 2_500, "EUR")
            .expect("record");
        db.complete_donation(&user(), &donation_id())
            .expect("settle");

        let trail = db
            .admin_actions(&AuditSubject::User(user()))
            .expect("list");
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].kind, AdminActionKind::DonationCompleted);
        assert_eq!(trail[0].old_value.as_deref(), Some("pending"));
        assert_eq!(trail[0].new_value.as_deref(), Some("completed"));
    }
}
