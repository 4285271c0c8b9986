use std::time::{Duration, Instant};

use bytes::Bytes;

#[derive(Clone, Debug)]
pub struct CacheEntry {
    /// Raw origin response, status line included.
    pub response: Bytes,
    pub inserted_at: Instant,
    /// Always non-zero.
    pub max_age: Duration,
}

impl CacheEntry {
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) < self.max_age
    }
}
