pub mod timestamp;

pub use timestamp::{Timestamp, TimestampDecodeError, TimestampEncodeError};

use derive_more::Display;
use std::str::FromStr;
use thiserror::Error as ThisError;
use ulid::Ulid;

///
/// IdParseError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum IdParseError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier contains '#', which is reserved for key templates")]
    ReservedSeparator,

    #[error("invalid ulid: {0}")]
    Ulid(String),
}

///
/// UserId
///
/// External identity-provider subject id. Opaque to the core, but it is
/// embedded verbatim in partition keys, so the key separator is rejected.
///

#[derive(Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Result<Self, IdParseError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdParseError::Empty);
        }
        if id.contains('#') {
            return Err(IdParseError::ReservedSeparator);
        }

        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for UserId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

macro_rules! ulid_id {
    ($(#[$docs:meta])* $name:ident) => {
        $(#[$docs])*
        #[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub struct $name(Ulid);

        impl $name {
            #[must_use]
            pub const fn from_ulid(ulid: Ulid) -> Self {
                Self(ulid)
            }

            #[must_use]
            pub const fn ulid(&self) -> Ulid {
                self.0
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ulid::from_string(s)
                    .map(Self)
                    .map_err(|err| IdParseError::Ulid(err.to_string()))
            }
        }
    };
}

ulid_id! {
    ///
    /// SeasonId
    ///
    SeasonId
}

ulid_id! {
    ///
    /// ArtId
    ///
    ArtId
}

ulid_id! {
    ///
    /// DonationId
    ///
    DonationId
}
