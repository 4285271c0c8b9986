use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Why an origin connection could not be opened.
///
/// Callers answer all of these with a gateway failure; the variants exist
/// so the cause can be logged.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("request names no origin host")]
    MissingHost,

    #[error("invalid origin authority {authority:?}")]
    InvalidAuthority { authority: String },

    #[error("failed to resolve {host}")]
    Resolve {
        host: String,
        #[source]
        source: Option<io::Error>,
    },

    #[error("connection to {addr} refused")]
    Refused {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("connection to {addr} timed out")]
    TimedOut { addr: SocketAddr },
}

impl ConnectError {
    /// True for failures before any address was known.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            ConnectError::MissingHost
                | ConnectError::InvalidAuthority { .. }
                | ConnectError::Resolve { .. }
        )
    }
}
