use crate::{
    error::{Error, ErrorOrigin},
    types::Timestamp,
};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error as ThisError;

///
/// External collaborators
///
/// Contracts the core consumes but does not own. Identity-provider and
/// object-store failures are always best-effort from the core's point of
/// view; only the lifecycle worker can fail an enclosing operation.
///

///
/// CollaboratorError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{0}")]
pub struct CollaboratorError(pub String);

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

///
/// IdentityProvider
///
/// Consumed only by the cascading-deletion and audit-lookup flows.
///

pub trait IdentityProvider {
    fn disable_account(&self, user_id: &str) -> Result<(), CollaboratorError>;

    fn delete_account(&self, user_id: &str) -> Result<(), CollaboratorError>;

    fn get_account_attributes(&self, user_id: &str) -> Result<Value, CollaboratorError>;
}

///
/// ObjectStore
///
/// Consumed only by deletion flows.
///

pub trait ObjectStore {
    fn list_objects(&self, prefix: &str) -> Result<Vec<String>, CollaboratorError>;

    fn delete_objects(&self, keys: &[String]) -> Result<(), CollaboratorError>;
}

///
/// Invocation
///
/// Opaque synchronous response from the season-lifecycle worker.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Invocation {
    pub status_code: u16,
    pub payload: Value,
}

///
/// LifecycleWorker
///

pub trait LifecycleWorker {
    fn invoke(&self, action: &str, payload: &Value) -> Result<Invocation, CollaboratorError>;
}

/// Classify a worker response: any non-200 status or an `errorMessage`
/// field in the payload fails the enclosing operation.
pub fn classify_invocation(invocation: Invocation) -> Result<Value, Error> {
    if invocation.status_code != 200 {
        return Err(Error::dependency(
            ErrorOrigin::Lifecycle,
            format!("worker returned status {}", invocation.status_code),
        ));
    }

    if let Some(message) = invocation.payload.get("errorMessage") {
        return Err(Error::dependency(
            ErrorOrigin::Lifecycle,
            format!("worker reported error: {message}"),
        ));
    }

    Ok(invocation.payload)
}

///
/// Clock
///
/// Timestamp source seam so audit ordering is deterministic under test.
///

pub trait Clock {
    fn now(&self) -> Timestamp;
}

///
/// SystemClock
///

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or(0);

        #[allow(clippy::cast_possible_truncation)]
        Timestamp::from_unix_millis(millis as u64)
    }
}

///
/// NoopIdentity / NoopObjectStore / NoopLifecycle
///
/// Defaults for deployments that wire a collaborator in later. Identity and
/// object-store calls succeed as no-ops; lifecycle invocation is a
/// configuration error.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopIdentity;

impl IdentityProvider for NoopIdentity {
    fn disable_account(&self, _: &str) -> Result<(), CollaboratorError> {
        Ok(())
    }

    fn delete_account(&self, _: &str) -> Result<(), CollaboratorError> {
        Ok(())
    }

    fn get_account_attributes(&self, _: &str) -> Result<Value, CollaboratorError> {
        Ok(Value::Null)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObjectStore;

impl ObjectStore for NoopObjectStore {
    fn list_objects(&self, _: &str) -> Result<Vec<String>, CollaboratorError> {
        Ok(Vec::new())
    }

    fn delete_objects(&self, _: &[String]) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLifecycle;

impl LifecycleWorker for NoopLifecycle {
    fn invoke(&self, action: &str, _: &Value) -> Result<Invocation, CollaboratorError> {
        Err(CollaboratorError::new(format!(
            "no lifecycle worker configured (action '{action}')"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_200_status_is_a_dependency_failure() {
        let err = classify_invocation(Invocation {
            status_code: 502,
            payload: Value::Null,
        })
        .expect_err("non-200 must fail");
        assert_eq!(err.class, crate::error::ErrorClass::Dependency);
    }

    #[test]
    fn error_message_field_is_a_dependency_failure() {
        let err = classify_invocation(Invocation {
            status_code: 200,
            payload: json!({"errorMessage": "season overlap"}),
        })
        .expect_err("errorMessage must fail");
        assert!(err.message.contains("season overlap"));
    }

    #[test]
    fn clean_200_passes_the_payload_through() {
        let payload = json!({"season": "next"});
        let out = classify_invocation(Invocation {
            status_code: 200,
            payload: payload.clone(),
        })
        .expect("clean response passes");
        assert_eq!(out, payload);
    }
}
