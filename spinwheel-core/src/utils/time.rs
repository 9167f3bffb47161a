// src/utils/time.rs

use chrono::{DateTime, Utc};

/// Converts a DateTime into epoch seconds for the SQLite backend.
pub fn to_epoch(dt: DateTime<Utc>) -> i64 {
    dt.timestamp()
}

/// Converts epoch seconds back into a DateTime.
pub fn from_epoch(epoch: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(epoch, 0)
        .expect("Valid epoch seconds should yield a valid DateTime")
}

/// Returns the current epoch seconds.
pub fn current_epoch() -> i64 {
    Utc::now().timestamp()
}
