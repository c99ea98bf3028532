use derive_more::Display;
use std::sync::LazyLock;
use thiserror::Error as ThisError;
use time::{
    OffsetDateTime, PrimitiveDateTime,
    format_description::{self, OwnedFormatItem},
};

// Fixed-width ISO-8601 UTC with millisecond precision. Lexicographic order of
// the encoded form must equal chronological order; every component is
// zero-padded and the offset is the literal `Z`.
static SORT_KEY_FORMAT: LazyLock<OwnedFormatItem> = LazyLock::new(|| {
    format_description::parse_owned::<2>(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z",
    )
    .expect("timestamp sort-key format description is valid")
});

/// Encoded length of a sort-key timestamp, e.g. `2026-03-01T12:00:00.000Z`.
pub const ENCODED_TIMESTAMP_LEN: usize = 24;

///
/// TimestampEncodeError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum TimestampEncodeError {
    #[error("timestamp {millis} ms is outside the encodable year range")]
    OutOfRange { millis: u64 },
}

///
/// TimestampDecodeError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum TimestampDecodeError {
    #[error("timestamp has invalid length: {len} (expected {ENCODED_TIMESTAMP_LEN})")]
    InvalidLength { len: usize },

    #[error("timestamp failed to parse: {0}")]
    Parse(String),

    #[error("timestamp predates the epoch")]
    PreEpoch,
}

///
/// Timestamp
///
/// Milliseconds since the UNIX epoch. The sort-key encoding is part of the
/// persisted key layout; do not change it without a migration.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Timestamp(u64);

impl Timestamp {
    #[must_use]
    pub const fn from_unix_millis(millis: u64) -> Self {
        Self(millis)
    }

    #[must_use]
    pub const fn unix_millis(&self) -> u64 {
        self.0
    }

    /// Encode into the fixed-width sort-key form.
    pub fn encode(&self) -> Result<String, TimestampEncodeError> {
        let nanos = i128::from(self.0) * 1_000_000;
        let datetime = OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .map_err(|_| TimestampEncodeError::OutOfRange { millis: self.0 })?;

        // Years past 9999 would widen the year field and break ordering.
        if datetime.year() > 9999 {
            return Err(TimestampEncodeError::OutOfRange { millis: self.0 });
        }

        datetime
            .format(&*SORT_KEY_FORMAT)
            .map_err(|_| TimestampEncodeError::OutOfRange { millis: self.0 })
    }

    /// Decode a sort-key timestamp. Fails closed on any malformed input.
    pub fn decode(encoded: &str) -> Result<Self, TimestampDecodeError> {
        if encoded.len() != ENCODED_TIMESTAMP_LEN {
            return Err(TimestampDecodeError::InvalidLength { len: encoded.len() });
        }

        let parsed = PrimitiveDateTime::parse(encoded, &*SORT_KEY_FORMAT)
            .map_err(|err| TimestampDecodeError::Parse(err.to_string()))?
            .assume_utc();

        let nanos = parsed.unix_timestamp_nanos();
        if nanos < 0 {
            return Err(TimestampDecodeError::PreEpoch);
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(Self((nanos / 1_000_000) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encode_is_fixed_width_utc() {
        let ts = Timestamp::from_unix_millis(1_764_588_123_456);
        let encoded = ts.encode().expect("in-range timestamp should encode");
        assert_eq!(encoded.len(), ENCODED_TIMESTAMP_LEN);
        assert!(encoded.ends_with('Z'));
        assert_eq!(encoded, "2025-12-01T11:22:03.456Z");
    }

    #[test]
    fn encode_rejects_post_9999_timestamps() {
        // 2262-ish is fine; year 10000 is not.
        let too_late = Timestamp::from_unix_millis(253_402_300_800_000);
        assert_eq!(
            too_late.encode(),
            Err(TimestampEncodeError::OutOfRange {
                millis: 253_402_300_800_000
            })
        );
    }

    #[test]
    fn decode_fails_closed_on_malformed_input() {
        assert_eq!(
            Timestamp::decode("2025-12-01"),
            Err(TimestampDecodeError::InvalidLength { len: 10 })
        );
        assert!(matches!(
            Timestamp::decode("2025-13-01T11:22:03.456Z"),
            Err(TimestampDecodeError::Parse(_))
        ));
    }

    proptest! {
        #[test]
        fn encode_decode_round_trips(millis in 0u64..253_402_300_799_999) {
            let ts = Timestamp::from_unix_millis(millis);
            let encoded = ts.encode().unwrap();
            prop_assert_eq!(Timestamp::decode(&encoded).unwrap(), ts);
        }

        #[test]
        fn lexicographic_order_equals_chronological(a in 0u64..4_102_444_800_000, b in 0u64..4_102_444_800_000) {
            let ea = Timestamp::from_unix_millis(a).encode().unwrap();
            let eb = Timestamp::from_unix_millis(b).encode().unwrap();
            prop_assert_eq!(a.cmp(&b), ea.cmp(&eb));
        }
    }
}
