use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::lookup_host;
use tokio::time::timeout;
use tracing::debug;

use crate::error::ConnectError;

/// Maps a hostname to an address.
///
/// Implementations report failure as [`ConnectError::Resolve`] so it stays
/// distinct from connection failures.
pub trait Resolver: Send + Sync + 'static {
    fn resolve(
        &self,
        host: &str,
        port: u16,
    ) -> impl Future<Output = Result<SocketAddr, ConnectError>> + Send;
}

/// System resolver (getaddrinfo via tokio), bounded by a timeout.
#[derive(Debug, Clone)]
pub struct DnsResolver {
    timeout: Duration,
}

impl DnsResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for DnsResolver {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl Resolver for DnsResolver {
    async fn resolve(&self, host: &str, port: u16) -> Result<SocketAddr, ConnectError> {
        let failed = |source| ConnectError::Resolve {
            host: host.to_string(),
            source,
        };

        let addrs = match timeout(self.timeout, lookup_host((host, port))).await {
            Ok(Ok(addrs)) => addrs,
            Ok(Err(e)) => return Err(failed(Some(e))),
            Err(_) => return Err(failed(None)),
        };

        // Prefer IPv4, matching what most origins listen on.
        let all: Vec<SocketAddr> = addrs.collect();
        let addr = all
            .iter()
            .find(|a| a.is_ipv4())
            .or_else(|| all.first())
            .copied()
            .ok_or_else(|| failed(None))?;

        debug!(target: "cachux::proxy", %host, %addr, "Resolved origin host");
        Ok(addr)
    }
}

/// Fixed host table. Unknown names fail resolution.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    hosts: HashMap<String, SocketAddr>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `host` to `addr`; the requested port is ignored for mapped hosts.
    pub fn with_host(mut self, host: impl Into<String>, addr: SocketAddr) -> Self {
        self.hosts.insert(host.into().to_ascii_lowercase(), addr);
        self
    }
}

impl Resolver for StaticResolver {
    async fn resolve(&self, host: &str, _port: u16) -> Result<SocketAddr, ConnectError> {
        self.hosts
            .get(&host.to_ascii_lowercase())
            .copied()
            .ok_or_else(|| ConnectError::Resolve {
                host: host.to_string(),
                source: None,
            })
    }
}
