use std::time::Duration;

use serde::Deserialize;

// =======================================================
// CACHE CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached responses.
    pub capacity: usize,
    /// TTL for responses that declare no positive max-age.
    pub default_ttl_secs: u64,
    /// How often the stats reporter logs.
    pub stats_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 4,
            default_ttl_secs: 300,
            stats_interval_secs: 30,
        }
    }
}

impl CacheConfig {
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs)
    }

    pub(crate) fn apply_defaults_from(&mut self, defaults: &CacheConfig) {
        if self.capacity == 0 {
            self.capacity = defaults.capacity;
        }
        if self.default_ttl_secs == 0 {
            self.default_ttl_secs = defaults.default_ttl_secs;
        }
        if self.stats_interval_secs == 0 {
            self.stats_interval_secs = defaults.stats_interval_secs;
        }
    }
}
