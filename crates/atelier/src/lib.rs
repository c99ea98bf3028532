//! ## Crate layout
//! - `core`: keyspace, typed entity store, cursor codec, query planner,
//!   cascade engine, operation flows, and observability.
//!
//! The `prelude` module mirrors the domain surface used inside service
//! code; everything else is reachable through `core`.

pub use atelier_core as core;

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use core::{error::Error, store::Db};

///
/// Service Prelude
///

pub mod prelude {
    pub use crate::core::prelude::*;
    pub use crate::core::{
        external::{IdentityProvider, LifecycleWorker, ObjectStore},
        store::{Db, contract::StorageBackend, memory::MemoryBackend, retry::RetryPolicy},
    };
}
