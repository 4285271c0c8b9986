use std::net::{IpAddr, SocketAddr};

use tokio::{
    net::TcpStream,
    time::{timeout, Duration},
};
use tracing::{debug, instrument, warn};

use crate::error::ConnectError;
use crate::origin::OriginConnection;
use crate::resolver::{DnsResolver, Resolver};

#[derive(Debug, Clone, Copy)]
pub struct ConnectorTimeouts {
    pub connect: Duration,
    pub read: Duration,
    pub write: Duration,
}

impl Default for ConnectorTimeouts {
    fn default() -> Self {
        let five = Duration::from_secs(5);
        Self {
            connect: five,
            read: five,
            write: five,
        }
    }
}

/// Opens origin connections. One attempt per call, no retries.
pub struct TargetConnector<R = DnsResolver> {
    resolver: R,
    timeouts: ConnectorTimeouts,
    default_port: u16,
}

impl<R: Resolver> TargetConnector<R> {
    pub fn new(resolver: R, timeouts: ConnectorTimeouts, default_port: u16) -> Self {
        Self {
            resolver,
            timeouts,
            default_port,
        }
    }

    /// Connects to `authority` (`host[:port]`).
    ///
    /// Literal IP addresses skip the resolver.
    #[instrument(skip(self))]
    pub async fn connect(&self, authority: &str) -> Result<OriginConnection, ConnectError> {
        let (host, port) = split_host_port(authority, self.default_port)?;

        let addr = match host.parse::<IpAddr>() {
            Ok(ip) => SocketAddr::new(ip, port),
            Err(_) => self.resolver.resolve(&host, port).await?,
        };

        debug!(target: "cachux::proxy", %host, %addr, "Connecting to origin");

        match timeout(self.timeouts.connect, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                if let Err(e) = stream.set_nodelay(true) {
                    warn!(target: "cachux::proxy", %addr, error = ?e, "Failed to set TCP_NODELAY");
                }
                Ok(OriginConnection::new(
                    stream,
                    addr,
                    self.timeouts.read,
                    self.timeouts.write,
                ))
            }
            Ok(Err(source)) => Err(ConnectError::Refused { addr, source }),
            Err(_) => Err(ConnectError::TimedOut { addr }),
        }
    }
}

/// Splits `host[:port]`, accepting bracketed IPv6 literals.
pub fn split_host_port(authority: &str, default_port: u16) -> Result<(String, u16), ConnectError> {
    let authority = authority.trim();
    if authority.is_empty() {
        return Err(ConnectError::MissingHost);
    }

    let invalid = || ConnectError::InvalidAuthority {
        authority: authority.to_string(),
    };

    if let Some(rest) = authority.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
        let port = match tail.strip_prefix(':') {
            Some(port) => port.parse().map_err(|_| invalid())?,
            None if tail.is_empty() => default_port,
            None => return Err(invalid()),
        };
        return Ok((host.to_string(), port));
    }

    match authority.rsplit_once(':') {
        // Bare IPv6 without brackets: treat the whole thing as the host.
        Some((host, _)) if host.contains(':') => Ok((authority.to_string(), default_port)),
        Some((host, port)) => {
            let port = port.parse().map_err(|_| invalid())?;
            if host.is_empty() {
                return Err(invalid());
            }
            Ok((host.to_string(), port))
        }
        None => Ok((authority.to_string(), default_port)),
    }
}
