//! Snowflake <-> timestamp conversion
//!
//! A snowflake stores milliseconds since a platform epoch in its high bits, shifted left
//! past the worker/sequence bits. Failures never propagate: every operation returns
//! `None` and logs why.

use chrono::{DateTime, Utc};
use tracing::warn;

/// 2015-01-01T00:00:00.000Z
pub const DISCORD_EPOCH_MILLIS: i64 = 1_420_070_400_000;

/// Low-order bits reserved for worker, process and sequence ids.
pub const DISCORD_TIMESTAMP_SHIFT: u32 = 22;

/// Parameters of a snowflake-style id scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnowflakeCodec {
    pub epoch_millis: i64,
    pub timestamp_shift: u32,
}

pub const DISCORD: SnowflakeCodec = SnowflakeCodec {
    epoch_millis: DISCORD_EPOCH_MILLIS,
    timestamp_shift: DISCORD_TIMESTAMP_SHIFT,
};

impl SnowflakeCodec {
    /// Largest millisecond offset that still fits in a `u64` after shifting.
    const fn max_offset_millis(&self) -> u64 {
        u64::MAX >> self.timestamp_shift
    }

    /// Render `date` as the smallest snowflake created at that millisecond.
    #[must_use]
    pub fn encode(&self, date: DateTime<Utc>) -> Option<String> {
        let Some(offset) = date.timestamp_millis().checked_sub(self.epoch_millis) else {
            warn!("Cannot encode {} as snowflake: offset from epoch overflows", date);
            return None;
        };
        let Ok(offset) = u64::try_from(offset) else {
            warn!("Cannot encode {} as snowflake: before platform epoch", date);
            return None;
        };
        if offset > self.max_offset_millis() {
            warn!("Cannot encode {} as snowflake: out of range", date);
            return None;
        }

        let snowflake = (offset << self.timestamp_shift).to_string();

        match self.decode(&snowflake) {
            Some(decoded) if decoded.timestamp_millis() == date.timestamp_millis() => {
                Some(snowflake)
            }
            _ => {
                warn!("Snowflake {} for {} failed round-trip check", snowflake, date);
                None
            }
        }
    }

    /// Creation time embedded in `snowflake`, to millisecond precision.
    #[must_use]
    pub fn decode(&self, snowflake: &str) -> Option<DateTime<Utc>> {
        let raw = match snowflake.trim().parse::<u64>() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Cannot decode snowflake '{}': {}", snowflake, e);
                return None;
            }
        };

        let decoded = i64::try_from(raw >> self.timestamp_shift)
            .ok()
            .and_then(|offset| offset.checked_add(self.epoch_millis))
            .and_then(DateTime::<Utc>::from_timestamp_millis);
        if decoded.is_none() {
            warn!("Snowflake '{}' decodes to an unrepresentable date", snowflake);
        }
        decoded
    }
}

/// [`SnowflakeCodec::encode`] with the Discord scheme.
#[must_use]
pub fn date_to_snowflake(date: DateTime<Utc>) -> Option<String> {
    DISCORD.encode(date)
}

/// [`SnowflakeCodec::decode`] with the Discord scheme.
#[must_use]
pub fn snowflake_to_date(snowflake: &str) -> Option<DateTime<Utc>> {
    DISCORD.decode(snowflake)
}
