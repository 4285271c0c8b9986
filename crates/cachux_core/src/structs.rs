use std::sync::Arc;

use cachux_cache::MemoryCacheStore;
use cachux_config::{CachuxConfig, ProxyConfig};
use cachux_proxy::{ConnectorTimeouts, DnsResolver, Resolver, TargetConnector};
use tokio::time::Duration;

/// Bounds applied to the client side of every connection.
#[derive(Debug, Clone, Copy)]
pub struct ClientLimits {
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub read_buffer_bytes: usize,
}

impl ClientLimits {
    pub fn from_config(proxy: &ProxyConfig) -> Self {
        Self {
            read_timeout: proxy.client_read_timeout(),
            write_timeout: proxy.client_write_timeout(),
            read_buffer_bytes: proxy.read_buffer_bytes(),
        }
    }
}

/// State shared by every connection task: the cache, the way out to
/// origins, and the client-side limits.
pub struct ProxyRuntime<R: Resolver = DnsResolver> {
    pub cache: Arc<MemoryCacheStore>,
    pub connector: TargetConnector<R>,
    pub limits: ClientLimits,
}

impl<R: Resolver> ProxyRuntime<R> {
    pub fn new(cache: Arc<MemoryCacheStore>, connector: TargetConnector<R>, limits: ClientLimits) -> Self {
        Self {
            cache,
            connector,
            limits,
        }
    }
}

impl ProxyRuntime<DnsResolver> {
    pub fn from_config(cfg: &CachuxConfig) -> Self {
        let cache = Arc::new(MemoryCacheStore::new(
            cfg.cache.capacity(),
            cfg.cache.default_ttl(),
        ));

        let timeouts = ConnectorTimeouts {
            connect: cfg.proxy.origin_connect_timeout(),
            read: cfg.proxy.origin_read_timeout(),
            write: cfg.proxy.origin_write_timeout(),
        };
        let resolver = DnsResolver::new(cfg.proxy.origin_connect_timeout());
        let connector = TargetConnector::new(resolver, timeouts, cfg.proxy.default_origin_port());

        Self::new(cache, connector, ClientLimits::from_config(&cfg.proxy))
    }
}
