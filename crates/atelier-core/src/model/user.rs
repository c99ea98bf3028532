use crate::{
    keyspace::{RecordKey, user_key},
    store::item::{Attr, Item, ItemDecodeError, bool_attr, keyed_item, num_attr, str_attr},
    types::UserId,
};
use derive_more::Display;
use std::str::FromStr;

pub const ATTR_USER_ID: &str = "user_id";
pub const ATTR_ROLE: &str = "role";
pub const ATTR_CAN_SUBMIT: &str = "can_submit";
pub const ATTR_SUBMISSION_QUOTA: &str = "submission_quota";

///
/// Role
///
/// `submission_quota` is derived from the role and must be rewritten in the
/// same write as any role change.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Role {
    #[display("admin")]
    Admin,
    #[display("contributor")]
    Contributor,
    #[display("guardian")]
    Guardian,
    #[display("user")]
    User,
}

impl Role {
    /// Per-season submission allowance; `-1` means unlimited, `0` would
    /// mean the role may not submit at all.
    #[must_use]
    pub const fn submission_quota(self) -> i64 {
        match self {
            Self::Admin | Self::Guardian => -1,
            Self::Contributor => 3,
            Self::User => 1,
        }
    }
}

impl FromStr for Role {
    type Err = ItemDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "contributor" => Ok(Self::Contributor),
            "guardian" => Ok(Self::Guardian),
            "user" => Ok(Self::User),
            other => Err(ItemDecodeError::InvalidValue {
                attr: ATTR_ROLE,
                value: other.to_string(),
            }),
        }
    }
}

///
/// UserProfile
///
/// Exactly one per user. `can_submit` is the ban flag: banning a user
/// flips it to false and nothing else.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UserProfile {
    pub user_id: UserId,
    pub role: Role,
    pub can_submit: bool,
    pub submission_quota: i64,
}

impl UserProfile {
    /// New profile with the quota derived from the role.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            can_submit: true,
            submission_quota: role.submission_quota(),
        }
    }

    #[must_use]
    pub fn key(&self) -> RecordKey {
        user_key(&self.user_id)
    }

    #[must_use]
    pub fn to_item(&self) -> Item {
        let mut item = keyed_item(&self.key());
        item.insert(
            ATTR_USER_ID.to_string(),
            Attr::S(self.user_id.to_string()),
        );
        item.insert(ATTR_ROLE.to_string(), Attr::S(self.role.to_string()));
        item.insert(ATTR_CAN_SUBMIT.to_string(), Attr::Bool(self.can_submit));
        item.insert(
            ATTR_SUBMISSION_QUOTA.to_string(),
            Attr::N(self.submission_quota),
        );
        item
    }

    pub fn try_from_item(item: &Item) -> Result<Self, ItemDecodeError> {
        let user_id = UserId::new(str_attr(item, ATTR_USER_ID)?).map_err(|err| {
            ItemDecodeError::InvalidValue {
                attr: ATTR_USER_ID,
                value: err.to_string(),
            }
        })?;
        let role = Role::from_str(str_attr(item, ATTR_ROLE)?)?;

        Ok(Self {
            user_id,
            role,
            can_submit: bool_attr(item, ATTR_CAN_SUBMIT)?,
            submission_quota: num_attr(item, ATTR_SUBMISSION_QUOTA)?,
        })
    }
}
