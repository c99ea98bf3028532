use crate::{
    keyspace::{
        KeyEncodeError, RecordKey, artwork_key, time_index_entry, vote_index_entry,
    },
    store::item::{
        ATTR_GSI1_PK, ATTR_GSI1_SK, ATTR_GSI2_PK, ATTR_GSI2_SK, Attr, Item, ItemDecodeError,
        bool_attr, keyed_item, num_attr, str_attr,
    },
    types::{ArtId, SeasonId, Timestamp, UserId},
};
use std::str::FromStr;

pub const ATTR_ART_ID: &str = "art_id";
pub const ATTR_OWNER_ID: &str = "user_id";
pub const ATTR_SEASON_ID: &str = "season_id";
pub const ATTR_TITLE: &str = "title";
pub const ATTR_VOTES: &str = "votes";
pub const ATTR_APPROVED: &str = "approved";
pub const ATTR_SUBMITTED_AT: &str = "submitted_at";

///
/// Artwork
///
/// Belongs to exactly one user and one season. Both secondary-index
/// projections are carried redundantly on the record: the time index for
/// "most recent" ordering and the vote index for "most voted".
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Artwork {
    pub art_id: ArtId,
    pub user_id: UserId,
    pub season_id: SeasonId,
    pub title: String,
    pub votes: u64,
    pub approved: bool,
    pub submitted_at: Timestamp,
}

impl Artwork {
    #[must_use]
    pub fn key(&self) -> RecordKey {
        artwork_key(&self.art_id)
    }

    pub fn to_item(&self) -> Result<Item, KeyEncodeError> {
        let (time_pk, time_sk) = time_index_entry(&self.season_id, self.submitted_at)?;
        let (vote_pk, vote_sk) =
            vote_index_entry(&self.season_id, self.votes, self.submitted_at)?;

        let mut item = keyed_item(&self.key());
        item.insert(ATTR_ART_ID.to_string(), Attr::S(self.art_id.to_string()));
        item.insert(ATTR_OWNER_ID.to_string(), Attr::S(self.user_id.to_string()));
        item.insert(
            ATTR_SEASON_ID.to_string(),
            Attr::S(self.season_id.to_string()),
        );
        item.insert(ATTR_TITLE.to_string(), Attr::S(self.title.clone()));
        #[allow(clippy::cast_possible_wrap)]
        item.insert(ATTR_VOTES.to_string(), Attr::N(self.votes as i64));
        item.insert(ATTR_APPROVED.to_string(), Attr::Bool(self.approved));
        item.insert(
            ATTR_SUBMITTED_AT.to_string(),
            Attr::S(self.submitted_at.encode()?),
        );

        item.insert(ATTR_GSI1_PK.to_string(), Attr::S(time_pk));
        item.insert(ATTR_GSI1_SK.to_string(), Attr::S(time_sk));
        item.insert(ATTR_GSI2_PK.to_string(), Attr::S(vote_pk));
        item.insert(ATTR_GSI2_SK.to_string(), Attr::S(vote_sk));

        Ok(item)
    }

    pub fn try_from_item(item: &Item) -> Result<Self, ItemDecodeError> {
        let art_id = parse_id::<ArtId>(item, ATTR_ART_ID)?;
        let season_id = parse_id::<SeasonId>(item, ATTR_SEASON_ID)?;
        let user_id = UserId::new(str_attr(item, ATTR_OWNER_ID)?).map_err(|err| {
            ItemDecodeError::InvalidValue {
                attr: ATTR_OWNER_ID,
                value: err.to_string(),
            }
        })?;

        let votes = num_attr(item, ATTR_VOTES)?;
        let votes = u64::try_from(votes).map_err(|_| ItemDecodeError::InvalidValue {
            attr: ATTR_VOTES,
            value: votes.to_string(),
        })?;

        let submitted_at =
            Timestamp::decode(str_attr(item, ATTR_SUBMITTED_AT)?).map_err(|err| {
                ItemDecodeError::InvalidValue {
                    attr: ATTR_SUBMITTED_AT,
                    value: err.to_string(),
                }
            })?;

        Ok(Self {
            art_id,
            user_id,
            season_id,
            title: str_attr(item, ATTR_TITLE)?.to_string(),
            votes,
            approved: bool_attr(item, ATTR_APPROVED)?,
            submitted_at,
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

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    fn artwork() -> Artwork {
        Artwork {
            art_id: ArtId::from_ulid(Ulid::from_parts(1_700_000_100_000, 2)),
            user_id: UserId::new("auth0|alice").expect("valid id"),
            season_id: SeasonId::from_ulid(Ulid::from_parts(1_700_000_000_000, 1)),
            title: "Glass Tide".to_string(),
            votes: 8,
            approved: true,
            submitted_at: Timestamp::from_unix_millis(1_764_588_000_000),
        }
    }

    #[test]
    fn artwork_round_trips_through_an_item() {
        let artwork = artwork();
        let item = artwork.to_item().expect("projections encode");
        assert_eq!(Artwork::try_from_item(&item), Ok(artwork));
    }

    #[test]
    fn projections_carry_season_and_padded_votes() {
        let artwork = artwork();
        let item = artwork.to_item().expect("projections encode");

        assert_eq!(
            str_attr(&item, ATTR_GSI1_PK).expect("time index pk"),
            artwork.season_id.to_string()
        );
        assert!(
            str_attr(&item, ATTR_GSI2_SK)
                .expect("vote index sk")
                .starts_with("0000008#")
        );
    }

    #[test]
    fn negative_vote_count_is_corruption() {
        let mut item = artwork().to_item().expect("projections encode");
        item.insert(ATTR_VOTES.to_string(), Attr::N(-1));

        assert_eq!(
            Artwork::try_from_item(&item),
            Err(ItemDecodeError::InvalidValue {
                attr: ATTR_VOTES,
                value: "-1".to_string(),
            })
        );
    }
}
