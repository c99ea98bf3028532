use crate::{
    keyspace::RecordKey,
    store::item::{Attr, Item},
};
use derive_more::Display;
use thiserror::Error as ThisError;

///
/// Storage backend contract
///
/// The only seam the data layer talks to storage through. The model assumes
/// single-item conditional writes and no multi-record transactions; every
/// multi-step invariant in the crate is decomposed accordingly.
///

/// Per-call item limit for batch deletes; larger inputs are chunked.
pub const MAX_BATCH_DELETE_KEYS: usize = 25;

///
/// BackendError
///
/// The small fixed set of error kinds the contract admits. `Throttled` is
/// the only retryable kind.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum BackendError {
    #[error("record not found")]
    NotFound,

    #[error("record vanished or re-checked value changed")]
    Gone,

    #[error("record already exists")]
    AlreadyExists,

    #[error("backend throttled the call")]
    Throttled,

    #[error("backend failure: {0}")]
    Unknown(String),
}

impl BackendError {
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Throttled)
    }
}

///
/// Condition
///
/// Conditional-write expression evaluated atomically with the write.
/// `AttrEquals` composes an existence check with a value re-check so a
/// caller never has to trust an earlier read.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Condition {
    None,
    KeyExists,
    KeyNotExists,
    AttrEquals(&'static str, Attr),
}

///
/// Update
///
/// Field mutation applied under a condition. `add` entries are atomic
/// counter-adds arbitrated by the backend, never read-modify-write.
///

#[derive(Clone, Debug, Default)]
pub struct Update {
    pub set: Vec<(&'static str, Attr)>,
    pub add: Vec<(&'static str, i64)>,
    pub condition: Option<Condition>,
}

impl Update {
    #[must_use]
    pub fn set(mut self, attr: &'static str, value: impl Into<Attr>) -> Self {
        self.set.push((attr, value.into()));
        self
    }

    #[must_use]
    pub fn add(mut self, attr: &'static str, delta: i64) -> Self {
        self.add.push((attr, delta));
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
}

///
/// Index
///
/// The two secondary projections over artwork records.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Index {
    /// Season-scoped, ordered by submission timestamp.
    #[display("submitted_at")]
    SubmittedAt,

    /// Season-scoped, ordered by zero-padded vote count then timestamp.
    #[display("votes")]
    Votes,
}

impl Index {
    #[must_use]
    pub const fn pk_attr(&self) -> &'static str {
        match self {
            Self::SubmittedAt => crate::store::item::ATTR_GSI1_PK,
            Self::Votes => crate::store::item::ATTR_GSI2_PK,
        }
    }

    #[must_use]
    pub const fn sk_attr(&self) -> &'static str {
        match self {
            Self::SubmittedAt => crate::store::item::ATTR_GSI1_SK,
            Self::Votes => crate::store::item::ATTR_GSI2_SK,
        }
    }
}

///
/// ScanDirection
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScanDirection {
    Ascending,
    Descending,
}

///
/// IndexPosition
///
/// Backend-native resume point of an index scan: the index sort key plus the
/// base-table key of the last item returned.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexPosition {
    pub index_sk: String,
    pub key: RecordKey,
}

///
/// IndexPage
///

#[derive(Debug, Default)]
pub struct IndexPage {
    pub items: Vec<Item>,
    pub resume: Option<IndexPosition>,
}

///
/// BatchDeleteOutcome
///
/// Best-effort result of a chunked batch delete. Chunk failures are
/// surfaced per-chunk, not as one atomic failure.
///

#[derive(Debug, Default)]
pub struct BatchDeleteOutcome {
    pub deleted: u64,
    pub failed_chunks: Vec<ChunkFailure>,
}

///
/// ChunkFailure
///

#[derive(Debug)]
pub struct ChunkFailure {
    pub keys: Vec<RecordKey>,
    pub reason: String,
}

///
/// StorageBackend
///
/// - `put` with `KeyNotExists` violated returns `AlreadyExists`.
/// - `update`/`delete` with `KeyExists` violated (record absent) return
///   `NotFound`; an `AttrEquals` mismatch on a present record returns
///   `Gone`.
/// - `update` returns the post-image of the record so counter-adds can be
///   observed without a second read.
///

pub trait StorageBackend {
    fn get(&self, key: &RecordKey) -> Result<Option<Item>, BackendError>;

    fn put(&self, item: Item, condition: Condition) -> Result<(), BackendError>;

    fn update(&self, key: &RecordKey, update: Update) -> Result<Item, BackendError>;

    fn delete(&self, key: &RecordKey, condition: Condition) -> Result<(), BackendError>;

    /// Every item in a partition whose sort key starts with `sk_prefix`,
    /// in sort-key order.
    fn query_prefix(&self, pk: &str, sk_prefix: &str) -> Result<Vec<Item>, BackendError>;

    fn query_index(
        &self,
        index: Index,
        pk: &str,
        direction: ScanDirection,
        limit: usize,
        start_after: Option<&IndexPosition>,
    ) -> Result<IndexPage, BackendError>;

    /// Best-effort chunked delete; never atomic across chunks.
    fn batch_delete(&self, keys: &[RecordKey]) -> Result<BatchDeleteOutcome, BackendError>;
}
