//! Conversions between `SystemTime` and whole UNIX seconds.
//!
//! Modification times are rounded up when compared against a cutoff and
//! the start of a run is rounded down when it is persisted. Together the
//! two roundings make sure a file touched during or after the start of a
//! run is picked up by the next incremental run, even on file systems that
//! drop sub-second precision.

use std::time::{SystemTime, UNIX_EPOCH};

/// Whole seconds since the epoch, rounded towards positive infinity.
pub fn unix_ceil(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => {
            let secs = after.as_secs() as i64;
            if after.subsec_nanos() > 0 {
                secs + 1
            } else {
                secs
            }
        }
        // ceil(-x) == -floor(x)
        Err(before) => -(before.duration().as_secs() as i64),
    }
}

/// Whole seconds since the epoch, rounded towards negative infinity.
pub fn unix_floor(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_secs() as i64,
        Err(before) => {
            let before = before.duration();
            let secs = before.as_secs() as i64;
            if before.subsec_nanos() > 0 {
                -secs - 1
            } else {
                -secs
            }
        }
    }
}
