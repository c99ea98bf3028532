use crate::store::contract::BackendError;
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Structured runtime error with a stable internal classification.
/// Every fallible surface in the crate returns this type; leaf error
/// enums convert into it with the class/origin of their boundary.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct Error {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Caller input rejected before any store call.
    pub(crate) fn validation(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Validation, origin, message)
    }

    /// Actor lacks permission or targets itself where forbidden.
    pub(crate) fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Authorization, ErrorOrigin::Cascade, message)
    }

    pub(crate) fn not_found(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::NotFound, origin, message)
    }

    /// Uniqueness violation, duplicate pointer, or no-op request.
    pub(crate) fn conflict(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Conflict, origin, message)
    }

    /// Target vanished (or a re-checked value changed) between read and write.
    pub(crate) fn gone(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Gone, origin, message)
    }

    /// Identity provider / object store / lifecycle worker failure.
    pub(crate) fn dependency(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Dependency, origin, message)
    }

    /// Undecodable persisted state.
    pub(crate) fn corruption(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Corruption, origin, message)
    }

    pub(crate) fn internal(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, origin, message)
    }

    /// Classify a backend error at a store boundary.
    ///
    /// `what` names the record the call was addressing so messages stay
    /// attributable without carrying raw keys around.
    pub(crate) fn from_backend(err: BackendError, origin: ErrorOrigin, what: &str) -> Self {
        let class = match &err {
            BackendError::NotFound => ErrorClass::NotFound,
            BackendError::Gone => ErrorClass::Gone,
            BackendError::AlreadyExists => ErrorClass::Conflict,
            BackendError::Throttled => ErrorClass::Throttled,
            BackendError::Unknown(_) => ErrorClass::Internal,
        };

        Self::new(class, origin, format!("{what}: {err}"))
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }

    #[must_use]
    pub const fn is_gone(&self) -> bool {
        matches!(self.class, ErrorClass::Gone)
    }

    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self.class, ErrorClass::Conflict)
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.class, ErrorClass::Validation)
    }

    #[must_use]
    pub const fn is_authorization(&self) -> bool {
        matches!(self.class, ErrorClass::Authorization)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorClass
///
/// Runtime error taxonomy. `Gone` is the concurrency outcome: the target
/// was deleted (or a re-checked value changed) between read and write.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Validation,
    Authorization,
    NotFound,
    Conflict,
    Gone,
    Dependency,
    Corruption,
    Throttled,
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Validation => "validation",
            Self::Authorization => "authorization",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Gone => "gone",
            Self::Dependency => "dependency",
            Self::Corruption => "corruption",
            Self::Throttled => "throttled",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
///
/// Which boundary produced the error.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Keyspace,
    Store,
    Cursor,
    Query,
    Cascade,
    Identity,
    ObjectStore,
    Lifecycle,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Keyspace => "keyspace",
            Self::Store => "store",
            Self::Cursor => "cursor",
            Self::Query => "query",
            Self::Cascade => "cascade",
            Self::Identity => "identity",
            Self::ObjectStore => "object_store",
            Self::Lifecycle => "lifecycle",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_map_to_their_classes() {
        let cases = [
            (BackendError::NotFound, ErrorClass::NotFound),
            (BackendError::Gone, ErrorClass::Gone),
            (BackendError::AlreadyExists, ErrorClass::Conflict),
            (BackendError::Throttled, ErrorClass::Throttled),
            (BackendError::Unknown("boom".into()), ErrorClass::Internal),
        ];

        for (backend, class) in cases {
            let err = Error::from_backend(backend, ErrorOrigin::Store, "user profile");
            assert_eq!(err.class, class);
            assert_eq!(err.origin, ErrorOrigin::Store);
            assert!(err.message.starts_with("user profile: "));
        }
    }

    #[test]
    fn display_with_class_is_origin_class_message() {
        let err = Error::gone(ErrorOrigin::Store, "season vanished");
        assert_eq!(err.display_with_class(), "store:gone: season vanished");
    }
}
