use crate::{
    keyspace::{KeyEncodeError, RecordKey, donation_key},
    store::item::{Attr, Item, ItemDecodeError, keyed_item, num_attr, str_attr},
    types::{DonationId, Timestamp, UserId},
};
use derive_more::Display;
use std::str::FromStr;

pub const ATTR_DONATION_ID: &str = "donation_id";
pub const ATTR_AMOUNT_MINOR: &str = "amount_minor";
pub const ATTR_CURRENCY: &str = "currency";
pub const ATTR_STATUS: &str = "status";
pub const ATTR_DONATED_AT: &str = "donated_at";

///
/// DonationStatus
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum DonationStatus {
    #[display("completed")]
    Completed,
    #[display("pending")]
    Pending,
    #[display("refunded")]
    Refunded,
}

impl FromStr for DonationStatus {
    type Err = ItemDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            "refunded" => Ok(Self::Refunded),
            other => Err(ItemDecodeError::InvalidValue {
                attr: ATTR_STATUS,
                value: other.to_string(),
            }),
        }
    }
}

///
/// Donation
///
/// Append-only; only the status field ever changes after the initial
/// write, and only through a value-re-checked conditional update.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Donation {
    pub user_id: UserId,
    pub donation_id: DonationId,
    pub amount_minor: u64,
    pub currency: String,
    pub status: DonationStatus,
    pub donated_at: Timestamp,
}

impl Donation {
    #[must_use]
    pub fn key(&self) -> RecordKey {
        donation_key(&self.user_id, &self.donation_id)
    }

    pub fn to_item(&self) -> Result<Item, KeyEncodeError> {
        let mut item = keyed_item(&self.key());
        item.insert(
            ATTR_DONATION_ID.to_string(),
            Attr::S(self.donation_id.to_string()),
        );
        #[allow(clippy::cast_possible_wrap)]
        item.insert(
            ATTR_AMOUNT_MINOR.to_string(),
            Attr::N(self.amount_minor as i64),
        );
        item.insert(ATTR_CURRENCY.to_string(), Attr::S(self.currency.clone()));
        item.insert(ATTR_STATUS.to_string(), Attr::S(self.status.to_string()));
        item.insert(
            ATTR_DONATED_AT.to_string(),
            Attr::S(self.donated_at.encode()?),
        );

        Ok(item)
    }

    pub fn try_from_item(item: &Item, user_id: UserId) -> Result<Self, ItemDecodeError> {
        let donation_id = str_attr(item, ATTR_DONATION_ID)?
            .parse::<DonationId>()
            .map_err(|err| ItemDecodeError::InvalidValue {
                attr: ATTR_DONATION_ID,
                value: err.to_string(),
            })?;

        let amount = num_attr(item, ATTR_AMOUNT_MINOR)?;
        let amount_minor =
            u64::try_from(amount).map_err(|_| ItemDecodeError::InvalidValue {
                attr: ATTR_AMOUNT_MINOR,
                value: amount.to_string(),
            })?;

        let donated_at = Timestamp::decode(str_attr(item, ATTR_DONATED_AT)?).map_err(|err| {
            ItemDecodeError::InvalidValue {
                attr: ATTR_DONATED_AT,
                value: err.to_string(),
            }
        })?;

        Ok(Self {
            user_id,
            donation_id,
            amount_minor,
            currency: str_attr(item, ATTR_CURRENCY)?.to_string(),
            status: DonationStatus::from_str(str_attr(item, ATTR_STATUS)?)?,
            donated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn donation_round_trips_through_an_item() {
        let user = UserId::new("auth0|alice").expect("valid id");
        let donation = Donation {
            user_id: user.clone(),
            donation_id: DonationId::from_ulid(Ulid::from_parts(1_700_000_200_000, 4)),
            amount_minor: 2_500,
            currency: "EUR".to_string(),
            status: DonationStatus::Pending,
            donated_at: Timestamp::from_unix_millis(1_764_588_000_000),
        };

        let item = donation.to_item().expect("timestamp encodes");
        assert_eq!(Donation::try_from_item(&item, user), Ok(donation));
    }

    #[test]
    fn unknown_status_fails_closed() {
        assert!(matches!(
            DonationStatus::from_str("gifted"),
            Err(ItemDecodeError::InvalidValue { .. })
        ));
    }
}
