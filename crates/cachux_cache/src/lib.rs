//! In-memory response cache with LRU eviction and per-entry max-age.

mod clock;
mod entry;
mod key;
mod policy;
mod store;

pub use clock::{Clock, SystemClock};
pub use entry::CacheEntry;
pub use key::CacheKey;
pub use policy::CachePolicy;
pub use store::{CacheLookup, CacheStats, MemoryCacheStore};
