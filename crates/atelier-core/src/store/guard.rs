use crate::{
    error::{Error, ErrorOrigin},
    keyspace::RecordKey,
    obs::{self, MetricsEvent, StoreOp},
    store::{
        Db,
        contract::{BackendError, Condition, StorageBackend, Update},
        item::Item,
    },
};

///
/// Optimistic concurrency guard
///
/// Every profile/season mutation is conditioned on "the record still
/// exists" at write time. This is not full optimistic concurrency (no
/// version compare-and-swap); it only detects the race where the target
/// was deleted between the authorization check and the mutation. Mutations
/// that must stay consistent with a value read earlier re-check that value
/// in the same conditional expression via [`Condition::AttrEquals`].
///
/// Condition misses surface as the `Gone` error class, which callers map
/// to "not found / already modified" rather than a server error.
///

impl<B: StorageBackend> Db<B> {
    /// Conditionally update an existing record. An `AttrEquals` condition
    /// on the update is kept (it already implies existence); anything else
    /// is tightened to `KeyExists`.
    pub(crate) fn guarded_update(
        &self,
        key: &RecordKey,
        update: Update,
        what: &str,
    ) -> Result<Item, Error> {
        let condition = match update.condition {
            Some(cond @ Condition::AttrEquals(..)) => cond,
            _ => Condition::KeyExists,
        };
        let update = Update {
            condition: Some(condition),
            ..update
        };

        self.call(StoreOp::Update, || {
            self.backend.update(key, update.clone())
        })
        .map_err(|err| Self::guard_miss(err, what))
    }

    /// Conditionally delete an existing record.
    pub(crate) fn guarded_delete(&self, key: &RecordKey, what: &str) -> Result<(), Error> {
        self.call(StoreOp::Delete, || {
            self.backend.delete(key, Condition::KeyExists)
        })
        .map_err(|err| Self::guard_miss(err, what))
    }

    fn guard_miss(err: BackendError, what: &str) -> Error {
        match err {
            BackendError::NotFound | BackendError::Gone => {
                obs::record(MetricsEvent::GuardMiss);
                Error::gone(
                    ErrorOrigin::Store,
                    format!("{what} vanished or changed between read and write"),
                )
            }
            other => Self::store_err(other, what),
        }
    }
}
