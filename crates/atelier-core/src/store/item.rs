use crate::{
    error::{Error, ErrorOrigin},
    keyspace::RecordKey,
};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// Attr
///
/// Attribute value in a stored item. The three shapes cover every field the
/// keyspace persists; numbers are signed so counter-adds have one arithmetic
/// domain.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Attr {
    S(String),
    N(i64),
    Bool(bool),
}

impl Attr {
    #[must_use]
    pub const fn type_label(&self) -> &'static str {
        match self {
            Self::S(_) => "string",
            Self::N(_) => "number",
            Self::Bool(_) => "bool",
        }
    }
}

impl From<String> for Attr {
    fn from(value: String) -> Self {
        Self::S(value)
    }
}

impl From<&str> for Attr {
    fn from(value: &str) -> Self {
        Self::S(value.to_string())
    }
}

impl From<i64> for Attr {
    fn from(value: i64) -> Self {
        Self::N(value)
    }
}

impl From<bool> for Attr {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Attribute map of a stored record, keyed by attribute name.
pub type Item = BTreeMap<String, Attr>;

/// Attribute names shared by every record.
pub const ATTR_PK: &str = "pk";
pub const ATTR_SK: &str = "sk";

/// Secondary-index projection attributes carried on artwork records.
pub const ATTR_GSI1_PK: &str = "gsi1pk";
pub const ATTR_GSI1_SK: &str = "gsi1sk";
pub const ATTR_GSI2_PK: &str = "gsi2pk";
pub const ATTR_GSI2_SK: &str = "gsi2sk";

///
/// ItemDecodeError
///
/// A persisted item that fails typed access is corrupt; decoding never
/// guesses or defaults.
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum ItemDecodeError {
    #[error("missing attribute: {attr}")]
    Missing { attr: &'static str },

    #[error("attribute {attr} has type {found} (expected {expected})")]
    TypeMismatch {
        attr: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("attribute {attr} has invalid value: {value}")]
    InvalidValue { attr: &'static str, value: String },
}

impl From<ItemDecodeError> for Error {
    fn from(err: ItemDecodeError) -> Self {
        Self::corruption(ErrorOrigin::Store, err.to_string())
    }
}

/// Borrow a string attribute, failing closed on absence or type mismatch.
pub fn str_attr<'a>(item: &'a Item, attr: &'static str) -> Result<&'a str, ItemDecodeError> {
    match item.get(attr) {
        Some(Attr::S(value)) => Ok(value),
        Some(other) => Err(ItemDecodeError::TypeMismatch {
            attr,
            expected: "string",
            found: other.type_label(),
        }),
        None => Err(ItemDecodeError::Missing { attr }),
    }
}

pub fn num_attr(item: &Item, attr: &'static str) -> Result<i64, ItemDecodeError> {
    match item.get(attr) {
        Some(Attr::N(value)) => Ok(*value),
        Some(other) => Err(ItemDecodeError::TypeMismatch {
            attr,
            expected: "number",
            found: other.type_label(),
        }),
        None => Err(ItemDecodeError::Missing { attr }),
    }
}

pub fn bool_attr(item: &Item, attr: &'static str) -> Result<bool, ItemDecodeError> {
    match item.get(attr) {
        Some(Attr::Bool(value)) => Ok(*value),
        Some(other) => Err(ItemDecodeError::TypeMismatch {
            attr,
            expected: "bool",
            found: other.type_label(),
        }),
        None => Err(ItemDecodeError::Missing { attr }),
    }
}

/// Borrow an optional string attribute; absence is `None`, a type mismatch
/// is still an error.
pub fn opt_str_attr<'a>(
    item: &'a Item,
    attr: &'static str,
) -> Result<Option<&'a str>, ItemDecodeError> {
    match item.get(attr) {
        Some(Attr::S(value)) => Ok(Some(value)),
        Some(other) => Err(ItemDecodeError::TypeMismatch {
            attr,
            expected: "string",
            found: other.type_label(),
        }),
        None => Ok(None),
    }
}

/// Extract the record key from a stored item.
pub fn item_key(item: &Item) -> Result<RecordKey, ItemDecodeError> {
    Ok(RecordKey::new(
        str_attr(item, ATTR_PK)?.to_string(),
        str_attr(item, ATTR_SK)?.to_string(),
    ))
}

/// Start an item with its key attributes populated.
#[must_use]
pub fn keyed_item(key: &RecordKey) -> Item {
    let mut item = Item::new();
    item.insert(ATTR_PK.to_string(), Attr::S(key.pk.clone()));
    item.insert(ATTR_SK.to_string(), Attr::S(key.sk.clone()));
    item
}
