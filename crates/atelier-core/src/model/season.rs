use crate::{
    keyspace::{KeyEncodeError, RecordKey, decode_season_sort_key, season_key},
    store::item::{
        ATTR_SK, Attr, Item, ItemDecodeError, bool_attr, keyed_item, str_attr,
    },
    types::{SeasonId, Timestamp},
};

pub const ATTR_SEASON_ID: &str = "season_id";
pub const ATTR_NAME: &str = "name";
pub const ATTR_IS_ACTIVE: &str = "is_active";
pub const ATTR_PAYMENT_REQUIRED: &str = "payment_required";
pub const ATTR_STARTS_AT: &str = "starts_at";

///
/// Season
///
/// The active flag is embedded in the sort key AND mirrored in
/// `is_active`; the two are written together, never independently, and a
/// mismatch on read is corruption.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Season {
    pub season_id: SeasonId,
    pub name: String,
    pub is_active: bool,
    pub payment_required: bool,
    pub starts_at: Timestamp,
}

impl Season {
    #[must_use]
    pub fn key(&self) -> RecordKey {
        season_key(&self.season_id, self.is_active)
    }

    pub fn to_item(&self) -> Result<Item, KeyEncodeError> {
        let mut item = keyed_item(&self.key());
        item.insert(
            ATTR_SEASON_ID.to_string(),
            Attr::S(self.season_id.to_string()),
        );
        item.insert(ATTR_NAME.to_string(), Attr::S(self.name.clone()));
        item.insert(ATTR_IS_ACTIVE.to_string(), Attr::Bool(self.is_active));
        item.insert(
            ATTR_PAYMENT_REQUIRED.to_string(),
            Attr::Bool(self.payment_required),
        );
        item.insert(
            ATTR_STARTS_AT.to_string(),
            Attr::S(self.starts_at.encode()?),
        );

        Ok(item)
    }

    pub fn try_from_item(item: &Item) -> Result<Self, ItemDecodeError> {
        let sk = str_attr(item, ATTR_SK)?;
        let (active_in_key, season_id) =
            decode_season_sort_key(sk).map_err(|err| ItemDecodeError::InvalidValue {
                attr: ATTR_SK,
                value: err.to_string(),
            })?;

        let is_active = bool_attr(item, ATTR_IS_ACTIVE)?;
        if is_active != active_in_key {
            return Err(ItemDecodeError::InvalidValue {
                attr: ATTR_IS_ACTIVE,
                value: format!("attribute {is_active} disagrees with sort key {active_in_key}"),
            });
        }

        let starts_at = Timestamp::decode(str_attr(item, ATTR_STARTS_AT)?).map_err(|err| {
            ItemDecodeError::InvalidValue {
                attr: ATTR_STARTS_AT,
                value: err.to_string(),
            }
        })?;

        Ok(Self {
            season_id,
            name: str_attr(item, ATTR_NAME)?.to_string(),
            is_active,
            payment_required: bool_attr(item, ATTR_PAYMENT_REQUIRED)?,
            starts_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    fn season() -> Season {
        Season {
            season_id: SeasonId::from_ulid(Ulid::from_parts(1_700_000_000_000, 1)),
            name: "Winter Open".to_string(),
            is_active: true,
            payment_required: true,
            starts_at: Timestamp::from_unix_millis(1_764_588_000_000),
        }
    }

    #[test]
    fn season_round_trips_through_an_item() {
        let season = season();
        let item = season.to_item().expect("in-range timestamp");
        assert_eq!(Season::try_from_item(&item), Ok(season));
    }

    #[test]
    fn flag_mismatch_between_key_and_attribute_is_corruption() {
        let mut item = season().to_item().expect("in-range timestamp");
        // Flip only the attribute, violating the written-together invariant.
        item.insert(ATTR_IS_ACTIVE.to_string(), Attr::Bool(false));

        assert!(matches!(
            Season::try_from_item(&item),
            Err(ItemDecodeError::InvalidValue {
                attr: ATTR_IS_ACTIVE,
                ..
            })
        ));
    }
}
