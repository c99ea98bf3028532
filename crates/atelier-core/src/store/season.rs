use crate::{
    error::{Error, ErrorOrigin},
    keyspace::{SEASON_PARTITION, season_key, season_prefix},
    model::Season,
    obs::{self, MetricsEvent, StoreOp},
    store::{
        Db,
        contract::{BackendError, Condition, StorageBackend},
    },
    types::SeasonId,
};

///
/// SeasonFilter
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SeasonFilter {
    Active,
    Inactive,
    All,
}

impl SeasonFilter {
    const fn active_flag(self) -> Option<bool> {
        match self {
            Self::Active => Some(true),
            Self::Inactive => Some(false),
            Self::All => None,
        }
    }
}

impl<B: StorageBackend> Db<B> {
    /// Look a season up by id. The active flag is part of the sort key, so
    /// both candidate keys are probed; a season exists under exactly one.
    pub fn get_season(&self, season: &SeasonId) -> Result<Option<Season>, Error> {
        for active in [true, false] {
            let key = season_key(season, active);
            let item = self
                .call(StoreOp::Get, || self.backend.get(&key))
                .map_err(|err| Self::store_err(err, "season"))?;

            if let Some(item) = item {
                return Season::try_from_item(&item).map(Some).map_err(Error::from);
            }
        }

        Ok(None)
    }

    pub(crate) fn require_season(&self, season: &SeasonId) -> Result<Season, Error> {
        self.get_season(season)?.ok_or_else(|| {
            Error::not_found(ErrorOrigin::Store, format!("season {season} not found"))
        })
    }

    pub(crate) fn put_season_if_absent(&self, season: &Season) -> Result<(), Error> {
        let item = season.to_item()?;
        self.call(StoreOp::Put, || {
            self.backend.put(item.clone(), Condition::KeyNotExists)
        })
        .map_err(|err| {
            if err == BackendError::AlreadyExists {
                obs::record(MetricsEvent::UniqueViolation);
            }
            Self::store_err(err, "season")
        })
    }

    /// Prefix query over the season partition; the filter selects the
    /// active-flag segment of the sort key, so no scan is involved.
    pub fn list_seasons(&self, filter: SeasonFilter) -> Result<Vec<Season>, Error> {
        let prefix = season_prefix(filter.active_flag());
        let items = self
            .call(StoreOp::QueryPrefix, || {
                self.backend.query_prefix(SEASON_PARTITION, &prefix)
            })
            .map_err(|err| Self::store_err(err, "season list"))?;

        items
            .iter()
            .map(|item| Season::try_from_item(item).map_err(Error::from))
            .collect()
    }
}
