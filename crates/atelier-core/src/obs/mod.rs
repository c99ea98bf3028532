//! Observability: runtime telemetry for store calls and cascade steps.
//!
//! Core logic must not reach into counter state directly; all
//! instrumentation flows through [`MetricsEvent`] and [`record`].

use std::cell::RefCell;
use std::collections::BTreeMap;

///
/// StoreOp
///

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum StoreOp {
    Get,
    Put,
    Update,
    Delete,
    QueryPrefix,
    QueryIndex,
    BatchDelete,
}

impl StoreOp {
    const fn label(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::QueryPrefix => "query_prefix",
            Self::QueryIndex => "query_index",
            Self::BatchDelete => "batch_delete",
        }
    }
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent {
    StoreCall { op: StoreOp },
    RetryAttempt,
    UniqueViolation,
    GuardMiss,
    CascadeStepFailed { step: &'static str },
    RecordsDeleted { count: u64 },
}

///
/// MetricsState
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MetricsState {
    pub store_calls: BTreeMap<&'static str, u64>,
    pub retries: u64,
    pub unique_violations: u64,
    pub guard_misses: u64,
    pub cascade_step_failures: BTreeMap<&'static str, u64>,
    pub records_deleted: u64,
}

thread_local! {
    static STATE: RefCell<MetricsState> = RefCell::new(MetricsState::default());
}

/// Record one event into the process-local counters.
pub fn record(event: MetricsEvent) {
    STATE.with(|state| {
        let mut state = state.borrow_mut();
        match event {
            MetricsEvent::StoreCall { op } => {
                let entry = state.store_calls.entry(op.label()).or_default();
                *entry = entry.saturating_add(1);
            }
            MetricsEvent::RetryAttempt => {
                state.retries = state.retries.saturating_add(1);
            }
            MetricsEvent::UniqueViolation => {
                state.unique_violations = state.unique_violations.saturating_add(1);
            }
            MetricsEvent::GuardMiss => {
                state.guard_misses = state.guard_misses.saturating_add(1);
            }
            MetricsEvent::CascadeStepFailed { step } => {
                let entry = state.cascade_step_failures.entry(step).or_default();
                *entry = entry.saturating_add(1);
            }
            MetricsEvent::RecordsDeleted { count } => {
                state.records_deleted = state.records_deleted.saturating_add(count);
            }
        }
    });
}

/// Snapshot the current counters for endpoint/test plumbing.
#[must_use]
pub fn metrics_report() -> MetricsState {
    STATE.with(|state| state.borrow().clone())
}

/// Reset all counters.
pub fn metrics_reset_all() {
    STATE.with(|state| {
        *state.borrow_mut() = MetricsState::default();
    });
}
