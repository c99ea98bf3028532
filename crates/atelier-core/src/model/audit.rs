use crate::{
    keyspace::{AuditSubject, KeyEncodeError, RecordKey, SEASON_PARTITION, admin_action_key},
    store::item::{
        ATTR_PK, Attr, Item, ItemDecodeError, keyed_item, opt_str_attr, str_attr,
    },
    types::{Timestamp, UserId},
};
use derive_more::Display;
use std::str::FromStr;

pub const ATTR_ACTOR_ID: &str = "actor_id";
pub const ATTR_ACTION: &str = "action";
pub const ATTR_OLD_VALUE: &str = "old_value";
pub const ATTR_NEW_VALUE: &str = "new_value";
pub const ATTR_DETAIL: &str = "detail";
pub const ATTR_AT: &str = "at";

///
/// AdminActionKind
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum AdminActionKind {
    #[display("account_deleted")]
    AccountDeleted,
    #[display("artworks_removed")]
    ArtworksRemoved,
    #[display("ban_changed")]
    BanChanged,
    #[display("donation_completed")]
    DonationCompleted,
    #[display("role_changed")]
    RoleChanged,
    #[display("season_activation")]
    SeasonActivation,
    #[display("season_created")]
    SeasonCreated,
    #[display("season_paid")]
    SeasonPaid,
}

impl FromStr for AdminActionKind {
    type Err = ItemDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "account_deleted" => Ok(Self::AccountDeleted),
            "artworks_removed" => Ok(Self::ArtworksRemoved),
            "ban_changed" => Ok(Self::BanChanged),
            "donation_completed" => Ok(Self::DonationCompleted),
            "role_changed" => Ok(Self::RoleChanged),
            "season_activation" => Ok(Self::SeasonActivation),
            "season_created" => Ok(Self::SeasonCreated),
            "season_paid" => Ok(Self::SeasonPaid),
            other => Err(ItemDecodeError::InvalidValue {
                attr: ATTR_ACTION,
                value: other.to_string(),
            }),
        }
    }
}

///
/// AdminAction
///
/// Append-only audit record. Never updated, never deleted by normal flows,
/// and never the target of the existence guard.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminAction {
    pub subject: AuditSubject,
    pub actor_id: UserId,
    pub kind: AdminActionKind,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub detail: Option<String>,
    pub at: Timestamp,
    pub suffix: Option<String>,
}

impl AdminAction {
    pub fn key(&self) -> Result<RecordKey, KeyEncodeError> {
        admin_action_key(&self.subject, self.at, self.suffix.as_deref())
    }

    pub fn to_item(&self) -> Result<Item, KeyEncodeError> {
        let mut item = keyed_item(&self.key()?);
        item.insert(ATTR_ACTOR_ID.to_string(), Attr::S(self.actor_id.to_string()));
        item.insert(ATTR_ACTION.to_string(), Attr::S(self.kind.to_string()));
        item.insert(ATTR_AT.to_string(), Attr::S(self.at.encode()?));

        if let Some(old_value) = &self.old_value {
            item.insert(ATTR_OLD_VALUE.to_string(), Attr::S(old_value.clone()));
        }
        if let Some(new_value) = &self.new_value {
            item.insert(ATTR_NEW_VALUE.to_string(), Attr::S(new_value.clone()));
        }
        if let Some(detail) = &self.detail {
            item.insert(ATTR_DETAIL.to_string(), Attr::S(detail.clone()));
        }

        Ok(item)
    }

    pub fn try_from_item(item: &Item) -> Result<Self, ItemDecodeError> {
        let pk = str_attr(item, ATTR_PK)?;
        let subject = if pk == SEASON_PARTITION {
            AuditSubject::Season
        } else {
            let user = pk
                .strip_prefix("USER#")
                .ok_or_else(|| ItemDecodeError::InvalidValue {
                    attr: ATTR_PK,
                    value: pk.to_string(),
                })?;
            AuditSubject::User(UserId::new(user).map_err(|err| {
                ItemDecodeError::InvalidValue {
                    attr: ATTR_PK,
                    value: err.to_string(),
                }
            })?)
        };

        let actor_id = UserId::new(str_attr(item, ATTR_ACTOR_ID)?).map_err(|err| {
            ItemDecodeError::InvalidValue {
                attr: ATTR_ACTOR_ID,
                value: err.to_string(),
            }
        })?;

        let at = Timestamp::decode(str_attr(item, ATTR_AT)?).map_err(|err| {
            ItemDecodeError::InvalidValue {
                attr: ATTR_AT,
                value: err.to_string(),
            }
        })?;

        Ok(Self {
            subject,
            actor_id,
            kind: AdminActionKind::from_str(str_attr(item, ATTR_ACTION)?)?,
            old_value: opt_str_attr(item, ATTR_OLD_VALUE)?.map(str::to_string),
            new_value: opt_str_attr(item, ATTR_NEW_VALUE)?.map(str::to_string),
            detail: opt_str_attr(item, ATTR_DETAIL)?.map(str::to_string),
            at,
            // The suffix only disambiguates sort keys; it is not read back.
            suffix: None,
        })
    }
}
