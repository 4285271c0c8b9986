//! Outbound side of the proxy: resolving origin hosts and opening
//! time-bounded TCP connections to them.

mod connector;
mod error;
mod origin;
mod resolver;

pub use connector::{split_host_port, ConnectorTimeouts, TargetConnector};
pub use error::ConnectError;
pub use origin::{OriginConnection, ReadOutcome};
pub use resolver::{DnsResolver, Resolver, StaticResolver};
