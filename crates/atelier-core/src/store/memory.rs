use crate::{
    keyspace::RecordKey,
    store::{
        contract::{
            BackendError, BatchDeleteOutcome, ChunkFailure, Condition, Index, IndexPage,
            IndexPosition, MAX_BATCH_DELETE_KEYS, ScanDirection, StorageBackend, Update,
        },
        item::{Attr, Item, item_key, str_attr},
    },
};
use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Mutex, MutexGuard},
};

///
/// MemoryBackend
///
/// In-memory backend honoring the full contract. The mutex is the
/// conditional-write arbiter, mirroring the store's per-record arbitration:
/// a condition is evaluated and applied under one lock acquisition.
///
/// Faults queued via [`MemoryBackend::inject_fault`] surface on upcoming
/// calls in FIFO order, which is how tests exercise throttling, partial
/// cascade failures, and retry budgets.
///

#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    rows: BTreeMap<(String, String), Item>,
    faults: VecDeque<BackendError>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an error to be returned by an upcoming call.
    pub fn inject_fault(&self, err: BackendError) {
        if let Ok(mut state) = self.state.lock() {
            state.faults.push_back(err);
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored record, in key order.
    pub fn records(&self) -> Vec<(RecordKey, Item)> {
        self.state.lock().map_or_else(
            |_| Vec::new(),
            |s| {
                s.rows
                    .iter()
                    .map(|((pk, sk), item)| {
                        (RecordKey::new(pk.clone(), sk.clone()), item.clone())
                    })
                    .collect()
            },
        )
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, BackendError> {
        self.state
            .lock()
            .map_err(|_| BackendError::Unknown("backend state poisoned".to_string()))
    }

    fn take_fault(state: &mut State) -> Result<(), BackendError> {
        match state.faults.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn check_condition(existing: Option<&Item>, condition: &Condition) -> Result<(), BackendError> {
    match (condition, existing) {
        (Condition::None, _) => Ok(()),
        (Condition::KeyExists, Some(_)) => Ok(()),
        (Condition::KeyExists, None) => Err(BackendError::NotFound),
        (Condition::KeyNotExists, None) => Ok(()),
        (Condition::KeyNotExists, Some(_)) => Err(BackendError::AlreadyExists),
        (Condition::AttrEquals(..), None) => Err(BackendError::NotFound),
        (Condition::AttrEquals(attr, expected), Some(item)) => {
            if item.get(*attr) == Some(expected) {
                Ok(())
            } else {
                Err(BackendError::Gone)
            }
        }
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &RecordKey) -> Result<Option<Item>, BackendError> {
        let mut state = self.lock()?;
        Self::take_fault(&mut state)?;

        Ok(state.rows.get(&(key.pk.clone(), key.sk.clone())).cloned())
    }

    fn put(&self, item: Item, condition: Condition) -> Result<(), BackendError> {
        let mut state = self.lock()?;
        Self::take_fault(&mut state)?;

        let key = item_key(&item)
            .map_err(|err| BackendError::Unknown(format!("item without key: {err}")))?;
        let slot = (key.pk, key.sk);

        check_condition(state.rows.get(&slot), &condition)?;
        state.rows.insert(slot, item);

        Ok(())
    }

    fn update(&self, key: &RecordKey, update: Update) -> Result<Item, BackendError> {
        let mut state = self.lock()?;
        Self::take_fault(&mut state)?;

        let slot = (key.pk.clone(), key.sk.clone());
        let condition = update.condition.unwrap_or(Condition::KeyExists);
        check_condition(state.rows.get(&slot), &condition)?;

        let Some(row) = state.rows.get_mut(&slot) else {
            // Updates never upsert; an absent target is NotFound even
            // without an explicit condition.
            return Err(BackendError::NotFound);
        };

        for (attr, value) in update.set {
            row.insert(attr.to_string(), value);
        }

        for (attr, delta) in update.add {
            let current = match row.get(attr) {
                Some(Attr::N(n)) => *n,
                Some(other) => {
                    return Err(BackendError::Unknown(format!(
                        "counter-add on non-number attribute {attr} ({})",
                        other.type_label()
                    )));
                }
                None => 0,
            };
            row.insert(attr.to_string(), Attr::N(current.saturating_add(delta)));
        }

        Ok(row.clone())
    }

    fn delete(&self, key: &RecordKey, condition: Condition) -> Result<(), BackendError> {
        let mut state = self.lock()?;
        Self::take_fault(&mut state)?;

        let slot = (key.pk.clone(), key.sk.clone());
        check_condition(state.rows.get(&slot), &condition)?;

        if state.rows.remove(&slot).is_none() {
            return Err(BackendError::NotFound);
        }

        Ok(())
    }

    fn query_prefix(&self, pk: &str, sk_prefix: &str) -> Result<Vec<Item>, BackendError> {
        let mut state = self.lock()?;
        Self::take_fault(&mut state)?;

        // BTreeMap key order gives sort-key order within the partition.
        Ok(state
            .rows
            .range((pk.to_string(), String::new())..(format!("{pk}\u{10FFFF}"), String::new()))
            .filter(|((row_pk, row_sk), _)| row_pk == pk && row_sk.starts_with(sk_prefix))
            .map(|(_, item)| item.clone())
            .collect())
    }

    fn query_index(
        &self,
        index: Index,
        pk: &str,
        direction: ScanDirection,
        limit: usize,
        start_after: Option<&IndexPosition>,
    ) -> Result<IndexPage, BackendError> {
        let mut state = self.lock()?;
        Self::take_fault(&mut state)?;

        // Resolve the projection by scanning; index maintenance is implicit
        // in the attributes each put writes.
        let mut entries: Vec<(String, RecordKey, Item)> = state
            .rows
            .values()
            .filter_map(|item| {
                let index_pk = str_attr(item, index.pk_attr()).ok()?;
                if index_pk != pk {
                    return None;
                }
                let index_sk = str_attr(item, index.sk_attr()).ok()?.to_string();
                let key = item_key(item).ok()?;
                Some((index_sk, key, item.clone()))
            })
            .collect();

        entries.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        if direction == ScanDirection::Descending {
            entries.reverse();
        }

        if let Some(position) = start_after {
            let anchor = (&position.index_sk, &position.key);
            entries.retain(|(sk, key, _)| match direction {
                ScanDirection::Ascending => (sk, key) > anchor,
                ScanDirection::Descending => (sk, key) < anchor,
            });
        }

        let more = entries.len() > limit;
        entries.truncate(limit);

        let resume = if more {
            entries
                .last()
                .map(|(index_sk, key, _)| IndexPosition {
                    index_sk: index_sk.clone(),
                    key: key.clone(),
                })
        } else {
            None
        };

        Ok(IndexPage {
            items: entries.into_iter().map(|(_, _, item)| item).collect(),
            resume,
        })
    }

    fn batch_delete(&self, keys: &[RecordKey]) -> Result<BatchDeleteOutcome, BackendError> {
        let mut outcome = BatchDeleteOutcome::default();

        for chunk in keys.chunks(MAX_BATCH_DELETE_KEYS) {
            let mut state = self.lock()?;

            if let Err(err) = Self::take_fault(&mut state) {
                outcome.failed_chunks.push(ChunkFailure {
                    keys: chunk.to_vec(),
                    reason: err.to_string(),
                });
                continue;
            }

            for key in chunk {
                if state
                    .rows
                    .remove(&(key.pk.clone(), key.sk.clone()))
                    .is_some()
                {
                    outcome.deleted += 1;
                }
            }
        }

        Ok(outcome)
    }
}
