use crate::{
    error::{Error, ErrorOrigin},
    keyspace::{artwork_key, vote_index_entry},
    model::{Artwork, artwork::ATTR_VOTES},
    obs::{self, MetricsEvent, StoreOp},
    store::{
        Db,
        contract::{BackendError, Condition, StorageBackend, Update},
        item::{ATTR_GSI2_SK, Attr},
    },
    types::ArtId,
};

impl<B: StorageBackend> Db<B> {
    pub fn get_artwork(&self, art: &ArtId) -> Result<Option<Artwork>, Error> {
        let key = artwork_key(art);
        let item = self
            .call(StoreOp::Get, || self.backend.get(&key))
            .map_err(|err| Self::store_err(err, "artwork"))?;

        item.as_ref()
            .map(Artwork::try_from_item)
            .transpose()
            .map_err(Error::from)
    }

    pub(crate) fn require_artwork(&self, art: &ArtId) -> Result<Artwork, Error> {
        self.get_artwork(art)?.ok_or_else(|| {
            Error::not_found(ErrorOrigin::Store, format!("artwork {art} not found"))
        })
    }

    pub(crate) fn put_artwork_if_absent(&self, artwork: &Artwork) -> Result<(), Error> {
        let item = artwork.to_item()?;
        self.call(StoreOp::Put, || {
            self.backend.put(item.clone(), Condition::KeyNotExists)
        })
        .map_err(|err| Self::store_err(err, "artwork"))
    }

    /// Idempotent delete: `Ok(false)` when the record was already gone.
    pub(crate) fn delete_artwork_if_exists(&self, art: &ArtId) -> Result<bool, Error> {
        let key = artwork_key(art);
        match self.call(StoreOp::Delete, || {
            self.backend.delete(&key, Condition::None)
        }) {
            Ok(()) => Ok(true),
            Err(BackendError::NotFound) => Ok(false),
            Err(err) => Err(Self::store_err(err, "artwork")),
        }
    }

    /// Atomically add one vote, conditioned on the artwork still existing.
    /// Returns the post-image vote count.
    pub(crate) fn increment_votes(&self, art: &ArtId) -> Result<u64, Error> {
        let key = artwork_key(art);
        let update = Update::default()
            .add(ATTR_VOTES, 1)
            .condition(Condition::KeyExists);

        let post = self.guarded_update(&key, update, "artwork")?;
        let artwork = Artwork::try_from_item(&post)?;

        Ok(artwork.votes)
    }

    /// Dependent write after a counter-add: refresh the vote-index sort key,
    /// re-checking the count so a racing later vote's projection wins.
    /// Best-effort; a miss is swallowed by the caller.
    pub(crate) fn refresh_vote_projection(&self, artwork: &Artwork) -> Result<(), Error> {
        let (_, vote_sk) =
            vote_index_entry(&artwork.season_id, artwork.votes, artwork.submitted_at)?;

        #[allow(clippy::cast_possible_wrap)]
        let expected = Attr::N(artwork.votes as i64);
        let update = Update::default()
            .set(ATTR_GSI2_SK, vote_sk)
            .condition(Condition::AttrEquals(ATTR_VOTES, expected));

        let key = artwork_key(&artwork.art_id);
        match self.call(StoreOp::Update, || self.backend.update(&key, update.clone())) {
            Ok(_) => Ok(()),
            Err(BackendError::Gone | BackendError::NotFound) => {
                // A newer count already owns the projection.
                obs::record(MetricsEvent::GuardMiss);
                Ok(())
            }
            Err(err) => Err(Self::store_err(err, "artwork vote projection")),
        }
    }
}
