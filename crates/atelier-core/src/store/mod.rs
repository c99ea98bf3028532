pub mod artwork;
pub mod audit;
pub mod contract;
pub mod donation;
pub mod guard;
pub mod item;
pub mod memory;
pub mod pointers;
pub mod profile;
pub mod retry;
pub mod season;

use crate::{
    error::{Error, ErrorOrigin},
    external::{
        Clock, IdentityProvider, LifecycleWorker, NoopIdentity, NoopLifecycle, NoopObjectStore,
        ObjectStore, SystemClock,
    },
    obs::{self, MetricsEvent, StoreOp},
    store::{
        contract::{BackendError, StorageBackend},
        retry::{RetryPolicy, with_retry},
    },
    types::Timestamp,
};
use std::sync::Arc;

///
/// Db
///
/// Handle over one storage backend plus the external collaborators the
/// mutation flows consume. Holds no other state: every operation is a
/// stateless function over the store, so concurrency correctness is a
/// property of per-record conditional writes.
///

pub struct Db<B: StorageBackend> {
    pub(crate) backend: B,
    pub(crate) retry: RetryPolicy,
    pub(crate) identity: Arc<dyn IdentityProvider>,
    pub(crate) objects: Arc<dyn ObjectStore>,
    pub(crate) lifecycle: Arc<dyn LifecycleWorker>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl<B: StorageBackend> Db<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            retry: RetryPolicy::default(),
            identity: Arc::new(NoopIdentity),
            objects: Arc::new(NoopObjectStore),
            lifecycle: Arc::new(NoopLifecycle),
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = identity;
        self
    }

    #[must_use]
    pub fn with_objects(mut self, objects: Arc<dyn ObjectStore>) -> Self {
        self.objects = objects;
        self
    }

    #[must_use]
    pub fn with_lifecycle(mut self, lifecycle: Arc<dyn LifecycleWorker>) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    pub(crate) fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Run one backend call under the retry policy, recording telemetry.
    pub(crate) fn call<T>(
        &self,
        op: StoreOp,
        f: impl FnMut() -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        obs::record(MetricsEvent::StoreCall { op });
        with_retry(self.retry, f)
    }

    /// Classify a backend error at the store boundary.
    pub(crate) fn store_err(err: BackendError, what: &str) -> Error {
        Error::from_backend(err, ErrorOrigin::Store, what)
    }
}
