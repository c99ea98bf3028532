use crate::{
    error::{Error, ErrorOrigin},
    keyspace::user_key,
    model::UserProfile,
    obs::{self, MetricsEvent, StoreOp},
    store::{
        Db,
        contract::{BackendError, Condition, StorageBackend},
    },
    types::UserId,
};

impl<B: StorageBackend> Db<B> {
    pub fn get_profile(&self, user: &UserId) -> Result<Option<UserProfile>, Error> {
        let key = user_key(user);
        let item = self
            .call(StoreOp::Get, || self.backend.get(&key))
            .map_err(|err| Self::store_err(err, "user profile"))?;

        item.as_ref()
            .map(UserProfile::try_from_item)
            .transpose()
            .map_err(Error::from)
    }

    /// Load a profile that must exist.
    pub(crate) fn require_profile(&self, user: &UserId) -> Result<UserProfile, Error> {
        self.get_profile(user)?.ok_or_else(|| {
            Error::not_found(ErrorOrigin::Store, format!("user {user} has no profile"))
        })
    }

    /// Create a profile; a second create for the same user is a conflict.
    pub fn create_profile(&self, profile: &UserProfile) -> Result<(), Error> {
        let item = profile.to_item();
        self.call(StoreOp::Put, || {
            self.backend.put(item.clone(), Condition::KeyNotExists)
        })
        .map_err(|err| {
            if err == BackendError::AlreadyExists {
                obs::record(MetricsEvent::UniqueViolation);
            }
            Self::store_err(err, "user profile")
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{Role, UserProfile},
        store::{Db, memory::MemoryBackend, retry::RetryPolicy},
        types::UserId,
    };

    fn db() -> Db<MemoryBackend> {
        Db::new(MemoryBackend::new()).with_retry(RetryPolicy::immediate())
    }

    #[test]
    fn create_then_get_round_trips() {
        let db = db();
        let user = UserId::new("auth0|alice").expect("valid id");
        let profile = UserProfile::new(user.clone(), Role::User);

        db.create_profile(&profile).expect("first create wins");
        assert_eq!(db.get_profile(&user).expect("get succeeds"), Some(profile));
    }

    #[test]
    fn duplicate_create_is_a_conflict() {
        let db = db();
        let profile = UserProfile::new(UserId::new("auth0|alice").expect("valid id"), Role::User);

        db.create_profile(&profile).expect("first create wins");
        let err = db.create_profile(&profile).expect_err("second must lose");
        assert!(err.is_conflict());
    }

    #[test]
    fn absent_profile_reads_as_none() {
        let db = db();
        let user = UserId::new("auth0|ghost").expect("valid id");
        assert_eq!(db.get_profile(&user).expect("get succeeds"), None);
        assert!(db.require_profile(&user).expect_err("absent").is_not_found());
    }
}
