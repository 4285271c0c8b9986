mod cache;
mod cachux;
mod global;
mod proxy;
mod validation;

pub use cache::CacheConfig;
pub use cachux::CachuxConfig;
pub use global::GlobalConfig;
pub use proxy::ProxyConfig;
pub use validation::{validate, ConfigReport};
