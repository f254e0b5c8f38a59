//! Clock and random ports, so time and randomness stay injectable.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Milliseconds since the epoch, for filename stamps.
    fn now_millis(&self) -> u64 {
        self.now().timestamp_millis().max(0) as u64
    }
}

pub trait RandomPort: Send + Sync {
    fn gen_range(&self, min: i32, max: i32) -> i32;
    fn gen_uuid(&self) -> Uuid;
}
