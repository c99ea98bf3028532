use crate::{
    error::Error,
    keyspace::{
        submission_pointer_key, submission_pointer_prefix, user_partition, vote_pointer_key,
        vote_pointer_prefix,
    },
    model::{SubmissionPointer, VotePointer},
    obs::{self, MetricsEvent, StoreOp},
    store::{
        Db,
        contract::{BackendError, Condition, StorageBackend},
    },
    types::{ArtId, SeasonId, UserId},
};

impl<B: StorageBackend> Db<B> {
    /// Conditionally create the per-(user, season) submission marker. A
    /// losing create is a conflict: the user already submitted this season.
    pub(crate) fn put_submission_pointer_if_absent(
        &self,
        pointer: &SubmissionPointer,
    ) -> Result<(), Error> {
        let item = pointer.to_item()?;
        self.call(StoreOp::Put, || {
            self.backend.put(item.clone(), Condition::KeyNotExists)
        })
        .map_err(|err| {
            if err == BackendError::AlreadyExists {
                obs::record(MetricsEvent::UniqueViolation);
            }
            Self::store_err(err, "submission pointer")
        })
    }

    pub fn submission_pointers(&self, user: &UserId) -> Result<Vec<SubmissionPointer>, Error> {
        let pk = user_partition(user);
        let items = self
            .call(StoreOp::QueryPrefix, || {
                self.backend.query_prefix(&pk, submission_pointer_prefix())
            })
            .map_err(|err| Self::store_err(err, "submission pointers"))?;

        items
            .iter()
            .map(|item| {
                SubmissionPointer::try_from_item(item, user.clone()).map_err(Error::from)
            })
            .collect()
    }

    pub(crate) fn delete_submission_pointer_if_exists(
        &self,
        user: &UserId,
        season: &SeasonId,
    ) -> Result<bool, Error> {
        let key = submission_pointer_key(user, season);
        match self.call(StoreOp::Delete, || {
            self.backend.delete(&key, Condition::None)
        }) {
            Ok(()) => Ok(true),
            Err(BackendError::NotFound) => Ok(false),
            Err(err) => Err(Self::store_err(err, "submission pointer")),
        }
    }

    /// Conditionally create the per-(user, artwork) vote marker. This write
    /// is the sole arbiter of one-vote-per-artwork; the counter add only
    /// happens after it wins.
    pub(crate) fn put_vote_pointer_if_absent(&self, pointer: &VotePointer) -> Result<(), Error> {
        let item = pointer.to_item()?;
        self.call(StoreOp::Put, || {
            self.backend.put(item.clone(), Condition::KeyNotExists)
        })
        .map_err(|err| {
            if err == BackendError::AlreadyExists {
                obs::record(MetricsEvent::UniqueViolation);
            }
            Self::store_err(err, "vote pointer")
        })
    }

    pub fn votes(&self, user: &UserId) -> Result<Vec<VotePointer>, Error> {
        let pk = user_partition(user);
        let items = self
            .call(StoreOp::QueryPrefix, || {
                self.backend.query_prefix(&pk, vote_pointer_prefix())
            })
            .map_err(|err| Self::store_err(err, "vote pointers"))?;

        items
            .iter()
            .map(|item| VotePointer::try_from_item(item, user.clone()).map_err(Error::from))
            .collect()
    }

    pub(crate) fn delete_vote_pointer_if_exists(
        &self,
        user: &UserId,
        art: &ArtId,
    ) -> Result<bool, Error> {
        let key = vote_pointer_key(user, art);
        match self.call(StoreOp::Delete, || {
            self.backend.delete(&key, Condition::None)
        }) {
            Ok(()) => Ok(true),
            Err(BackendError::NotFound) => Ok(false),
            Err(err) => Err(Self::store_err(err, "vote pointer")),
        }
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

    fn user() -> UserId {
        UserId::new("auth0|alice").expect("valid id")
    }

    fn submission(season: u128) -> SubmissionPointer {
        SubmissionPointer {
            user_id: user(),
            season_id: SeasonId::from_ulid(Ulid::from_parts(1_700_000_000_000, season)),
            art_id: ArtId::from_ulid(Ulid::from_parts(1_700_000_100_000, season)),
            submitted_at: Timestamp::from_unix_millis(1_764_588_000_000),
        }
    }

    fn vote(art: u128) -> VotePointer {
        VotePointer {
            user_id: user(),
            art_id: ArtId::from_ulid(Ulid::from_parts(1_700_000_100_000, art)),
            voted_at: Timestamp::from_unix_millis(1_764_588_100_000),
        }
    }

    #[test]
    fn second_submission_in_a_season_loses() {
        let db = db();
        db.put_submission_pointer_if_absent(&submission(1))
            .expect("first wins");

        let mut rival = submission(1);
        rival.art_id = ArtId::from_ulid(Ulid::from_parts(1_700_000_200_000, 9));
        let err = db
            .put_submission_pointer_if_absent(&rival)
            .expect_err("same season must lose");
        assert!(err.is_conflict());

        // A different season is a different key.
        db.put_submission_pointer_if_absent(&submission(2))
            .expect("new season wins");
    }

    #[test]
    fn double_vote_loses() {
        let db = db();
        db.put_vote_pointer_if_absent(&vote(1)).expect("first wins");

        let err = db
            .put_vote_pointer_if_absent(&vote(1))
            .expect_err("second must lose");
        assert!(err.is_conflict());
    }

    #[test]
    fn pointer_listings_stay_in_their_prefix() {
        let db = db();
        db.put_submission_pointer_if_absent(&submission(1))
            .expect("seed");
        db.put_vote_pointer_if_absent(&vote(1)).expect("seed");
        db.put_vote_pointer_if_absent(&vote(2)).expect("seed");

        assert_eq!(db.submission_pointers(&user()).expect("list").len(), 1);
        assert_eq!(db.votes(&user()).expect("list").len(), 2);
    }

    #[test]
    fn pointer_deletes_are_idempotent() {
        let db = db();
        let pointer = vote(1);
        db.put_vote_pointer_if_absent(&pointer).expect("seed");

        assert!(
            db.delete_vote_pointer_if_exists(&pointer.user_id, &pointer.art_id)
                .expect("first")
        );
        assert!(
            !db.delete_vote_pointer_if_exists(&pointer.user_id, &pointer.art_id)
                .expect("second")
        );
    }
}
