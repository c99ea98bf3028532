//! Core data layer for Atelier: the single-table keyspace, typed entity
//! store, cursor codec, cascade engine, and the operation flows exported
//! via the `prelude`.
#![warn(unreachable_pub)]

pub mod cascade;
pub mod cursor;
pub mod error;
pub mod external;
pub mod keyspace;
pub mod model;
pub mod obs;
pub mod ops;
pub mod query;
pub mod store;
pub mod types;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, backends, codecs, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        cascade::{DeletionReport, IdentityMode, IdentityOutcome, ItemFailure, RemovalReport},
        model::{
            AdminAction, AdminActionKind, Artwork, Donation, DonationStatus, Role, Season,
            SubmissionPointer, UserProfile, VotePointer,
        },
        query::{ArtOrder, Page},
        types::{ArtId, DonationId, SeasonId, Timestamp, UserId},
    };
}
