//! Date codec: milliseconds since the Unix epoch.
//!
//! Timestamps that fall on a whole minute (and whose minute count fits in 32
//! bits) are written as `x4b` + 4-byte minutes, all others as `x4a` + 8-byte
//! milliseconds.

use std::io::{Read, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::cursor::{InputCursor, OutputCursor};
use crate::tag;
use crate::Result;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// A UTC timestamp with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Date(pub i64);

impl Date {
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn millis(self) -> i64 {
        self.0
    }

    /// Converts to `SystemTime`; dates before the epoch are supported.
    pub fn to_system_time(self) -> SystemTime {
        if self.0 >= 0 {
            UNIX_EPOCH + Duration::from_millis(self.0 as u64)
        } else {
            UNIX_EPOCH - Duration::from_millis(self.0.unsigned_abs())
        }
    }
}

impl From<SystemTime> for Date {
    /// Sub-millisecond precision is truncated; out-of-range times saturate.
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Self(i64::try_from(after.as_millis()).unwrap_or(i64::MAX)),
            Err(before) => Self(i64::try_from(before.duration().as_millis()).map_or(i64::MIN, |m| -m)),
        }
    }
}

/// Writes a date, choosing the minute form when exact.
pub fn write_date<W: Write>(out: &mut OutputCursor<W>, millis: i64) -> Result<()> {
    if millis % MILLIS_PER_MINUTE == 0 {
        if let Ok(minutes) = i32::try_from(millis / MILLIS_PER_MINUTE) {
            let [b3, b2, b1, b0] = minutes.to_be_bytes();
            return out.write_bytes(&[tag::DATE_MINUTE, b3, b2, b1, b0]);
        }
    }
    let mut buf = [0u8; 9];
    buf[0] = tag::DATE;
    buf[1..].copy_from_slice(&millis.to_be_bytes());
    out.write_bytes(&buf)
}

/// Decodes the payload of a date tag. Returns `None` if `tag` is not a date form.
pub fn decode_date<R: Read>(tag: u8, input: &mut InputCursor<R>) -> Result<Option<i64>> {
    let millis = match tag {
        tag::DATE => i64::from_be_bytes(input.read_array::<8>("date")?),
        tag::DATE_MINUTE => i64::from(i32::from_be_bytes(input.read_array::<4>("date")?)) * MILLIS_PER_MINUTE,
        _ => return Ok(None),
    };
    Ok(Some(millis))
}
