use crate::{
    error::{Error, ErrorOrigin},
    keyspace::{donation_key, donation_prefix, user_partition},
    model::{Donation, DonationStatus, donation::ATTR_STATUS},
    obs::{self, MetricsEvent, StoreOp},
    store::{
        Db,
        contract::{BackendError, Condition, StorageBackend, Update},
        item::Attr,
    },
    types::{DonationId, UserId},
};

impl<B: StorageBackend> Db<B> {
    pub fn get_donation(
        &self,
        user: &UserId,
        donation: &DonationId,
    ) -> Result<Option<Donation>, Error> {
        let key = donation_key(user, donation);
        let item = self
            .call(StoreOp::Get, || self.backend.get(&key))
            .map_err(|err| Self::store_err(err, "donation"))?;

        item.as_ref()
            .map(|item| Donation::try_from_item(item, user.clone()))
            .transpose()
            .map_err(Error::from)
    }

    pub(crate) fn require_donation(
        &self,
        user: &UserId,
        donation: &DonationId,
    ) -> Result<Donation, Error> {
        self.get_donation(user, donation)?.ok_or_else(|| {
            Error::not_found(ErrorOrigin::Store, format!("donation {donation} not found"))
        })
    }

    pub(crate) fn put_donation_if_absent(&self, donation: &Donation) -> Result<(), Error> {
        let item = donation.to_item()?;
        self.call(StoreOp::Put, || {
            self.backend.put(item.clone(), Condition::KeyNotExists)
        })
        .map_err(|err| {
            if err == BackendError::AlreadyExists {
                obs::record(MetricsEvent::UniqueViolation);
            }
            Self::store_err(err, "donation")
        })
    }

    /// Flip a donation's status, re-checking the expected current status in
    /// the same conditional write. A racing transition surfaces as `Gone`.
    pub(crate) fn transition_donation_status(
        &self,
        user: &UserId,
        donation: &DonationId,
        from: DonationStatus,
        to: DonationStatus,
    ) -> Result<(), Error> {
        let key = donation_key(user, donation);
        let update = Update::default()
            .set(ATTR_STATUS, to.to_string())
            .condition(Condition::AttrEquals(ATTR_STATUS, Attr::S(from.to_string())));

        self.guarded_update(&key, update, "donation").map(|_| ())
    }

    pub fn donations(&self, user: &UserId) -> Result<Vec<Donation>, Error> {
        let pk = user_partition(user);
        let items = self
            .call(StoreOp::QueryPrefix, || {
                self.backend.query_prefix(&pk, donation_prefix())
            })
            .map_err(|err| Self::store_err(err, "donation list"))?;

        items
            .iter()
            .map(|item| Donation::try_from_item(item, user.clone()).map_err(Error::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        store::{memory::MemoryBackend, retry::RetryPolicy},
        types::Timestamp,
    };
    use ulid::Ulid;

    fn db() -> Db<MemoryBackend> {
        Db::new(MemoryBackend::new()).with_retry(RetryPolicy::immediate())
    }

    fn donation(n: u128) -> Donation {
        Donation {
            user_id: UserId::new("auth0|alice").expect("valid id"),
            donation_id: DonationId::from_ulid(Ulid::from_parts(1_700_000_200_000, n)),
            amount_minor: 2_500,
            currency: "EUR".to_string(),
            status: DonationStatus::Pending,
            donated_at: Timestamp::from_unix_millis(1_764_588_000_000),
        }
    }

    #[test]
    fn duplicate_donation_id_is_a_conflict() {
        let db = db();
        let donation = donation(1);
        db.put_donation_if_absent(&donation).expect("first wins");

        let err = db
            .put_donation_if_absent(&donation)
            .expect_err("second must lose");
        assert!(err.is_conflict());
    }

    #[test]
    fn status_transition_re_checks_the_current_status() {
        let db = db();
        let donation = donation(1);
        db.put_donation_if_absent(&donation).expect("seed");

        db.transition_donation_status(
            &donation.user_id,
            &donation.donation_id,
            DonationStatus::Pending,
            DonationStatus::Completed,
        )
        .expect("pending to completed");

        // Second completion sees "completed", not "pending".
        let err = db
            .transition_donation_status(
                &donation.user_id,
                &donation.donation_id,
                DonationStatus::Pending,
                DonationStatus::Completed,
            )
            .expect_err("stale expectation must lose");
        assert!(err.is_gone());

        let stored = db
            .get_donation(&donation.user_id, &donation.donation_id)
            .expect("get")
            .expect("present");
        assert_eq!(stored.status, DonationStatus::Completed);
    }

    #[test]
    fn listing_only_returns_the_donation_prefix() {
        let db = db();
        db.put_donation_if_absent(&donation(1)).expect("seed");
        db.put_donation_if_absent(&donation(2)).expect("seed");

        let listed = db.donations(&donation(1).user_id).expect("list");
        assert_eq!(listed.len(), 2);
    }
}
