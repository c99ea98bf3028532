use crate::{
    keyspace::{KeyEncodeError, RecordKey, submission_pointer_key, vote_pointer_key},
    store::item::{Attr, Item, ItemDecodeError, keyed_item, str_attr},
    types::{ArtId, SeasonId, Timestamp, UserId},
};
use std::str::FromStr;

pub const ATTR_ART_ID: &str = "art_id";
pub const ATTR_SEASON_ID: &str = "season_id";
pub const ATTR_SUBMITTED_AT: &str = "submitted_at";
pub const ATTR_VOTED_AT: &str = "voted_at";

///
/// SubmissionPointer
///
/// One-per-(user, season) marker. Its conditional creation is what
/// enforces "one submission per season"; it also lets a user's own
/// artworks be enumerated without touching the artwork partitions.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubmissionPointer {
    pub user_id: UserId,
    pub season_id: SeasonId,
    pub art_id: ArtId,
    pub submitted_at: Timestamp,
}

impl SubmissionPointer {
    #[must_use]
    pub fn key(&self) -> RecordKey {
        submission_pointer_key(&self.user_id, &self.season_id)
    }

    pub fn to_item(&self) -> Result<Item, KeyEncodeError> {
        let mut item = keyed_item(&self.key());
        item.insert(ATTR_ART_ID.to_string(), Attr::S(self.art_id.to_string()));
        item.insert(
            ATTR_SEASON_ID.to_string(),
            Attr::S(self.season_id.to_string()),
        );
        item.insert(
            ATTR_SUBMITTED_AT.to_string(),
            Attr::S(self.submitted_at.encode()?),
        );

        Ok(item)
    }

    pub fn try_from_item(item: &Item, user_id: UserId) -> Result<Self, ItemDecodeError> {
        Ok(Self {
            user_id,
            season_id: parse_id(item, ATTR_SEASON_ID)?,
            art_id: parse_id(item, ATTR_ART_ID)?,
            submitted_at: parse_ts(item, ATTR_SUBMITTED_AT)?,
        })
    }
}

///
/// VotePointer
///
/// Marks that a user has voted for an artwork; its conditional creation is
/// the sole arbiter of one-vote-per-(user, artwork).
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VotePointer {
    pub user_id: UserId,
    pub art_id: ArtId,
    pub voted_at: Timestamp,
}

impl VotePointer {
    #[must_use]
    pub fn key(&self) -> RecordKey {
        vote_pointer_key(&self.user_id, &self.art_id)
    }

    pub fn to_item(&self) -> Result<Item, KeyEncodeError> {
        let mut item = keyed_item(&self.key());
        item.insert(ATTR_ART_ID.to_string(), Attr::S(self.art_id.to_string()));
        item.insert(ATTR_VOTED_AT.to_string(), Attr::S(self.voted_at.encode()?));

        Ok(item)
    }

    pub fn try_from_item(item: &Item, user_id: UserId) -> Result<Self, ItemDecodeError> {
        Ok(Self {
            user_id,
            art_id: parse_id(item, ATTR_ART_ID)?,
            voted_at: parse_ts(item, ATTR_VOTED_AT)?,
        })
    }
}

fn parse_id<T: FromStr>(item: &Item, attr: &'static str) -> Result<T, ItemDecodeError> {
    let raw = str_attr(item, attr)?;
    raw.parse().map_err(|_| ItemDecodeError::InvalidValue {
        attr,
        value: raw.to_string(),
    })
}

fn parse_ts(item: &Item, attr: &'static str) -> Result<Timestamp, ItemDecodeError> {
    Timestamp::decode(str_attr(item, attr)?).map_err(|err| ItemDecodeError::InvalidValue {
        attr,
        value: err.to_string(),
    })
}
