use std::sync::Arc;

use cachux_cache::{CacheStats, MemoryCacheStore};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::info;

/// Logs a cache statistics line every `every` until the handle is aborted.
pub fn spawn_stats_reporter(cache: Arc<MemoryCacheStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            log_stats(&cache.stats());
        }
    })
}

fn hit_ratio(stats: &CacheStats) -> f64 {
    let lookups = stats.hits + stats.misses;
    if lookups == 0 {
        0.0
    } else {
        stats.hits as f64 / lookups as f64
    }
}

fn log_stats(stats: &CacheStats) {
    info!(
        target: "cachux::stats",
        entries = stats.entries,
        valid = stats.valid_entries,
        capacity = stats.capacity,
        hits = stats.hits,
        misses = stats.misses,
        expired = stats.expired,
        insertions = stats.insertions,
        evictions = stats.evictions,
        hit_ratio = format_args!("{:.2}", hit_ratio(stats)),
        "Cache statistics"
    );
}
