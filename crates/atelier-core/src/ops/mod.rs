//! Single-record operation flows.
//!
//! Each operation is the simple instance of the cascade pattern: read
//! current state, compute the derived fields that change as a function of
//! the new state, write only those fields under the concurrency guard, and
//! append an audit record.

pub mod donation;
pub mod season;
pub mod submit;
pub mod user;
pub mod vote;
