use std::num::NonZeroUsize;
use std::time::Duration;

pub struct CachePolicy;

impl CachePolicy {
    pub const DEFAULT_CAPACITY: NonZeroUsize = NonZeroUsize::new(4).unwrap();

    pub fn default_ttl() -> Duration {
        Duration::from_secs(300)
    }

    /// The origin's `max-age` when positive, the store default otherwise.
    pub fn effective_max_age(declared_secs: i64, default_ttl: Duration) -> Duration {
        match u64::try_from(declared_secs) {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ if default_ttl.is_zero() => Self::default_ttl(),
            _ => default_ttl,
        }
    }
}
