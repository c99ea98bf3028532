//! In-memory collaborator doubles for exercising mutation flows.

use crate::{
    external::{Clock, CollaboratorError, IdentityProvider, Invocation, LifecycleWorker, ObjectStore},
    types::Timestamp,
};
use serde_json::Value;
use std::{
    collections::VecDeque,
    sync::Mutex,
};

///
/// RecordingIdentity
///
/// Remembers every identity-provider call; optionally fails them all.
///

#[derive(Debug, Default)]
pub struct RecordingIdentity {
    pub calls: Mutex<Vec<String>>,
    pub fail: bool,
}

impl RecordingIdentity {
    #[must_use]
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn record(&self, call: String) -> Result<(), CollaboratorError> {
        self.calls.lock().expect("identity mutex").push(call);
        if self.fail {
            Err(CollaboratorError::new("identity provider unavailable"))
        } else {
            Ok(())
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("identity mutex").clone()
    }
}

impl IdentityProvider for RecordingIdentity {
    fn disable_account(&self, user_id: &str) -> Result<(), CollaboratorError> {
        self.record(format!("disable:{user_id}"))
    }

    fn delete_account(&self, user_id: &str) -> Result<(), CollaboratorError> {
        self.record(format!("delete:{user_id}"))
    }

    fn get_account_attributes(&self, user_id: &str) -> Result<Value, CollaboratorError> {
        self.record(format!("attributes:{user_id}"))?;
        Ok(serde_json::json!({ "sub": user_id }))
    }
}

///
/// MemoryObjectStore
///

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    pub objects: Mutex<Vec<String>>,
}

impl MemoryObjectStore {
    #[must_use]
    pub fn with_objects(objects: &[&str]) -> Self {
        Self {
            objects: Mutex::new(objects.iter().map(ToString::to_string).collect()),
        }
    }

    pub fn remaining(&self) -> Vec<String> {
        self.objects.lock().expect("object mutex").clone()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn list_objects(&self, prefix: &str) -> Result<Vec<String>, CollaboratorError> {
        Ok(self
            .objects
            .lock()
            .expect("object mutex")
            .iter()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn delete_objects(&self, keys: &[String]) -> Result<(), CollaboratorError> {
        self.objects
            .lock()
            .expect("object mutex")
            .retain(|key| !keys.contains(key));
        Ok(())
    }
}

///
/// ScriptedLifecycle
///
/// Replays a queue of canned invocation results in order.
///

#[derive(Debug, Default)]
pub struct ScriptedLifecycle {
    responses: Mutex<VecDeque<Result<Invocation, CollaboratorError>>>,
}

impl ScriptedLifecycle {
    #[must_use]
    pub fn replying(responses: Vec<Result<Invocation, CollaboratorError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

impl LifecycleWorker for ScriptedLifecycle {
    fn invoke(&self, _action: &str, _payload: &Value) -> Result<Invocation, CollaboratorError> {
        self.responses
            .lock()
            .expect("lifecycle mutex")
            .pop_front()
            .unwrap_or_else(|| Err(CollaboratorError::new("no scripted response left")))
    }
}

///
/// TickingClock
///
/// Deterministic clock that advances one millisecond per reading, so
/// consecutive audit keys in one flow never collide.
///

#[derive(Debug)]
pub struct TickingClock {
    next_millis: Mutex<u64>,
}

impl TickingClock {
    #[must_use]
    pub fn starting_at(millis: u64) -> Self {
        Self {
            next_millis: Mutex::new(millis),
        }
    }
}

impl Clock for TickingClock {
    fn now(&self) -> Timestamp {
        let mut next = self.next_millis.lock().expect("clock mutex");
        let now = *next;
        *next += 1;
        Timestamp::from_unix_millis(now)
    }
}
