
use crate::{
    error::{Error, ErrorOrigin},
    types::{ArtId, DonationId, SeasonId, Timestamp, TimestampEncodeError, UserId},
};
use derive_more::Display;
use std::str::FromStr;
use thiserror::Error as ThisError;

///
/// Keyspace
///
/// Pure key derivation for the single-table layout. No I/O. The literal
/// templates here are a wire contract: migration and backup tooling must
/// reproduce them exactly, including the vote-count padding width.
///

/// Partition key shared by every season record.
pub const SEASON_PARTITION: &str = "SEASON";

/// Artwork records carry a constant sort key; the partition key alone
/// identifies them.
pub const ARTWORK_SORT_KEY: &str = "N/A";

/// Fixed digit width of the vote-count component in the vote index.
/// Lexicographic sort-key order equals numeric vote order only while every
/// count fits this width. DO NOT CHANGE without a migration.
pub const VOTE_PAD_WIDTH: usize = 7;

/// Largest vote count encodable at [`VOTE_PAD_WIDTH`] digits.
pub const MAX_ENCODABLE_VOTES: u64 = 9_999_999;

///
/// KeyEncodeError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum KeyEncodeError {
    #[error("vote count {votes} exceeds the {VOTE_PAD_WIDTH}-digit index width")]
    VoteCountOverflow { votes: u64 },

    #[error("timestamp encoding failed: {0}")]
    Timestamp(#[from] TimestampEncodeError),
}

impl From<KeyEncodeError> for Error {
    fn from(err: KeyEncodeError) -> Self {
        Self::validation(ErrorOrigin::Keyspace, err.to_string())
    }
}

///
/// KeyDecodeError
/// (decode / corruption boundary)
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum KeyDecodeError {
    #[error("season sort key has invalid shape: {sk}")]
    SeasonShape { sk: String },

    #[error("season sort key has invalid active flag: {flag}")]
    SeasonActiveFlag { flag: String },

    #[error("season sort key has invalid season id: {id}")]
    SeasonId { id: String },
}

impl From<KeyDecodeError> for Error {
    fn from(err: KeyDecodeError) -> Self {
        Self::corruption(ErrorOrigin::Keyspace, err.to_string())
    }
}

///
/// RecordKey
///
/// The two-part address of a record: partition key groups related records,
/// sort key orders and distinguishes them within the group.
///

#[derive(Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("{pk}/{sk}")]
pub struct RecordKey {
    pub pk: String,
    pub sk: String,
}

impl RecordKey {
    #[must_use]
    pub const fn new(pk: String, sk: String) -> Self {
        Self { pk, sk }
    }
}

///
/// AuditSubject
///
/// Partition an admin-action record is appended under.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AuditSubject {
    User(UserId),
    Season,
}

impl AuditSubject {
    #[must_use]
    pub fn partition(&self) -> String {
        match self {
            Self::User(user) => user_partition(user),
            Self::Season => SEASON_PARTITION.to_string(),
        }
    }
}

// ── Base-table keys ───────────────────────────────────────────────

#[must_use]
pub fn user_partition(user: &UserId) -> String {
    format!("USER#{user}")
}

#[must_use]
pub fn user_key(user: &UserId) -> RecordKey {
    RecordKey::new(user_partition(user), "PROFILE".to_string())
}

#[must_use]
pub fn season_key(season: &SeasonId, active: bool) -> RecordKey {
    RecordKey::new(
        SEASON_PARTITION.to_string(),
        format!("#ACTIVE#{active}#SEASON#{season}"),
    )
}

#[must_use]
pub fn artwork_key(art: &ArtId) -> RecordKey {
    RecordKey::new(format!("ART#{art}"), ARTWORK_SORT_KEY.to_string())
}

#[must_use]
pub fn submission_pointer_key(user: &UserId, season: &SeasonId) -> RecordKey {
    RecordKey::new(user_partition(user), format!("ART#{season}"))
}

#[must_use]
pub fn vote_pointer_key(user: &UserId, art: &ArtId) -> RecordKey {
    RecordKey::new(user_partition(user), format!("VOTE#{art}"))
}

#[must_use]
pub fn donation_key(user: &UserId, donation: &DonationId) -> RecordKey {
    RecordKey::new(user_partition(user), format!("DONATION#{donation}"))
}

/// Audit sort keys embed the encoded timestamp; the optional suffix
/// disambiguates multiple actions recorded in the same millisecond.
pub fn admin_action_key(
    subject: &AuditSubject,
    at: Timestamp,
    suffix: Option<&str>,
) -> Result<RecordKey, KeyEncodeError> {
    let ts = at.encode()?;
    let sk = match suffix {
        Some(suffix) => format!("ADMIN_ACTION#{ts}#{suffix}"),
        None => format!("ADMIN_ACTION#{ts}"),
    };

    Ok(RecordKey::new(subject.partition(), sk))
}

// ── Secondary-index projections ───────────────────────────────────

/// Time-index entry for "most recent" ordering within a season.
pub fn time_index_entry(
    season: &SeasonId,
    submitted_at: Timestamp,
) -> Result<(String, String), KeyEncodeError> {
    Ok((season.to_string(), submitted_at.encode()?))
}

/// Vote-index entry: zero-padded vote count, then submission timestamp, so a
/// single descending range scan yields votes-desc-then-recency-desc.
pub fn vote_index_entry(
    season: &SeasonId,
    votes: u64,
    submitted_at: Timestamp,
) -> Result<(String, String), KeyEncodeError> {
    if votes > MAX_ENCODABLE_VOTES {
        return Err(KeyEncodeError::VoteCountOverflow { votes });
    }

    let ts = submitted_at.encode()?;
    Ok((season.to_string(), format!("{votes:0VOTE_PAD_WIDTH$}#{ts}")))
}

// ── Prefix builders ───────────────────────────────────────────────

/// Sort-key prefix selecting seasons by active flag; `None` selects all.
#[must_use]
pub fn season_prefix(active: Option<bool>) -> String {
    match active {
        Some(active) => format!("#ACTIVE#{active}#SEASON#"),
        None => "#ACTIVE#".to_string(),
    }
}

#[must_use]
pub const fn submission_pointer_prefix() -> &'static str {
    "ART#"
}

#[must_use]
pub const fn vote_pointer_prefix() -> &'static str {
    "VOTE#"
}

#[must_use]
pub const fn donation_prefix() -> &'static str {
    "DONATION#"
}

#[must_use]
pub const fn admin_action_prefix() -> &'static str {
    "ADMIN_ACTION#"
}

// ── Decoding ──────────────────────────────────────────────────────

/// Decode `(active, season_id)` from a season sort key. The embedded flag is
/// authoritative for the key's position; the caller cross-checks it against
/// the record's `is_active` attribute.
pub fn decode_season_sort_key(sk: &str) -> Result<(bool, SeasonId), KeyDecodeError> {
    let rest = sk
        .strip_prefix("#ACTIVE#")
        .ok_or_else(|| KeyDecodeError::SeasonShape { sk: sk.to_string() })?;

    let (flag, id) = rest
        .split_once("#SEASON#")
        .ok_or_else(|| KeyDecodeError::SeasonShape { sk: sk.to_string() })?;

    let active = match flag {
        "true" => true,
        "false" => false,
        other => {
            return Err(KeyDecodeError::SeasonActiveFlag {
                flag: other.to_string(),
            });
        }
    };

    let season =
        SeasonId::from_str(id).map_err(|_| KeyDecodeError::SeasonId { id: id.to_string() })?;

    Ok((active, season))
}
