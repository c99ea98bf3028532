//! Continuation-cursor wire codec.
//!
//! This module owns the opaque token format handed to API clients and no
//! query semantics. A token is the hex encoding of a small JSON envelope:
//! a version byte, the signature of the query that produced the page, and
//! the backend-native resume position. Decoding is fail-closed; any
//! malformed, tampered, or foreign token is rejected before it reaches
//! the planner.

use crate::{
    error::{Error, ErrorOrigin},
    keyspace::RecordKey,
    store::contract::IndexPosition,
    types::SeasonId,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error as ThisError;

/// Wire version of the token envelope.
pub const CURSOR_VERSION: u8 = 1;

// Decode bound for untrusted cursor token input.
pub const MAX_CURSOR_TOKEN_HEX_LEN: usize = 2 * 1024;

///
/// CursorDecodeError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum CursorDecodeError {
    #[error("cursor token is empty")]
    Empty,

    #[error("cursor token exceeds max length: {len} hex chars (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("cursor token must have an even number of hex characters")]
    OddLength,

    #[error("invalid hex character at position {position}")]
    InvalidHex { position: usize },

    #[error("cursor token payload is malformed")]
    Shape,

    #[error("unsupported cursor version: {found}")]
    Version { found: u8 },

    #[error("cursor does not belong to this query")]
    SignatureMismatch,
}

impl From<CursorDecodeError> for Error {
    fn from(err: CursorDecodeError) -> Self {
        Self::validation(ErrorOrigin::Cursor, err.to_string())
    }
}

///
/// ContinuationSignature
///
/// Digest binding a token to the query shape that produced it: wire
/// version, season partition, and order tag. A token replayed against a
/// different season or ordering fails the signature check instead of
/// resuming in the wrong keyspace.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ContinuationSignature([u8; 32]);

impl ContinuationSignature {
    #[must_use]
    pub fn sign(season: &SeasonId, order_tag: &str) -> Self {
        let mut hasher = Sha256::new();
        write_tag(&mut hasher, CURSOR_VERSION);
        write_str(&mut hasher, &season.to_string());
        write_str(&mut hasher, order_tag);
        Self(hasher.finalize().into())
    }

    #[must_use]
    pub fn as_hex(&self) -> String {
        encode_hex(&self.0)
    }
}

impl std::fmt::Display for ContinuationSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_hex())
    }
}

#[derive(Deserialize, Serialize)]
struct WireCursor {
    v: u8,
    sig: String,
    isk: String,
    pk: String,
    sk: String,
}

/// Encode a resume position as an opaque token bound to `signature`.
pub(crate) fn encode_token(
    signature: &ContinuationSignature,
    position: &IndexPosition,
) -> Result<String, Error> {
    let wire = WireCursor {
        v: CURSOR_VERSION,
        sig: signature.as_hex(),
        isk: position.index_sk.clone(),
        pk: position.key.pk.clone(),
        sk: position.key.sk.clone(),
    };
    let bytes = serde_json::to_vec(&wire)
        .map_err(|err| Error::internal(ErrorOrigin::Cursor, err.to_string()))?;

    Ok(encode_hex(&bytes))
}

/// Decode and verify a client token against the signature of the query it
/// is being resumed under.
pub(crate) fn decode_token(
    token: &str,
    expected: &ContinuationSignature,
) -> Result<IndexPosition, CursorDecodeError> {
    let bytes = decode_hex(token)?;
    let wire: WireCursor =
        serde_json::from_slice(&bytes).map_err(|_| CursorDecodeError::Shape)?;

    if wire.v != CURSOR_VERSION {
        return Err(CursorDecodeError::Version { found: wire.v });
    }
    if wire.sig != expected.as_hex() {
        return Err(CursorDecodeError::SignatureMismatch);
    }

    Ok(IndexPosition {
        index_sk: wire.isk,
        key: RecordKey::new(wire.pk, wire.sk),
    })
}

/// Encode raw bytes as a lowercase hex token.
#[must_use]
pub fn encode_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        use std::fmt::Write as _;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Decode a hex token into raw bytes. Surrounding whitespace is trimmed.
pub fn decode_hex(token: &str) -> Result<Vec<u8>, CursorDecodeError> {
    let token = token.trim();

    if token.is_empty() {
        return Err(CursorDecodeError::Empty);
    }

    if token.len() > MAX_CURSOR_TOKEN_HEX_LEN {
        return Err(CursorDecodeError::TooLong {
            len: token.len(),
            max: MAX_CURSOR_TOKEN_HEX_LEN,
        });
    }

    if !token.len().is_multiple_of(2) {
        return Err(CursorDecodeError::OddLength);
    }

    let mut out = Vec::with_capacity(token.len() / 2);
    let bytes = token.as_bytes();

    for idx in (0..bytes.len()).step_by(2) {
        let hi = decode_hex_nibble(bytes[idx])
            .ok_or(CursorDecodeError::InvalidHex { position: idx + 1 })?;

        let lo = decode_hex_nibble(bytes[idx + 1])
            .ok_or(CursorDecodeError::InvalidHex { position: idx + 2 })?;

        out.push((hi << 4) | lo);
    }

    Ok(out)
}

const fn decode_hex_nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

fn write_tag(hasher: &mut Sha256, tag: u8) {
    hasher.update([tag]);
}

fn write_str(hasher: &mut Sha256, value: &str) {
    #[allow(clippy::cast_possible_truncation)]
    hasher.update((value.len() as u32).to_be_bytes());
    hasher.update(value.as_bytes());
}

///
/// TESTS
///
