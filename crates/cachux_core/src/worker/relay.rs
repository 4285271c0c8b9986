use bytes::BytesMut;
use cachux_http::{response_body_state, ResponseBody};
use cachux_proxy::{OriginConnection, ReadOutcome};
use tokio::time::Duration;
use tracing::debug;

use super::timeouts::write_all_timeout;
use super::ClientStream;

/// Why relaying a response stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RelayEnd {
    OriginClosed,
    /// Declared length reached, or a response that carries no body.
    BodyComplete,
    OriginTimeout,
    OriginError,
    ClientGone,
}

pub(crate) struct Relayed {
    pub(crate) end: RelayEnd,
    pub(crate) body: ResponseBody,
    pub(crate) response: BytesMut,
}

impl Relayed {
    /// The accumulated bytes are the whole response.
    ///
    /// A relay that stopped on close or timeout counts unless the response
    /// declared a longer body than arrived.
    pub(crate) fn is_complete(&self) -> bool {
        match self.end {
            RelayEnd::BodyComplete => true,
            RelayEnd::OriginClosed | RelayEnd::OriginTimeout => {
                self.body != ResponseBody::Partial
            }
            RelayEnd::OriginError | RelayEnd::ClientGone => false,
        }
    }
}

/// Streams the origin's response to the client chunk by chunk, keeping a
/// copy of everything forwarded.
pub(crate) async fn relay_response(
    origin: &mut OriginConnection,
    client: &mut dyn ClientStream,
    head_request: bool,
    chunk: usize,
    write_timeout: Duration,
) -> Relayed {
    let mut response = BytesMut::new();
    let mut body = ResponseBody::Partial;
    let mut tmp = vec![0u8; chunk.max(1)];

    let end = loop {
        let n = match origin.read_chunk(&mut tmp).await {
            Ok(ReadOutcome::Read(0)) => break RelayEnd::OriginClosed,
            Ok(ReadOutcome::Read(n)) => n,
            Ok(ReadOutcome::Timeout) => break RelayEnd::OriginTimeout,
            Err(e) => {
                debug!(
                    target: "cachux::worker",
                    origin = %origin.addr(),
                    error = ?e,
                    "Origin read failed"
                );
                break RelayEnd::OriginError;
            }
        };

        if let Err(e) = write_all_timeout(client, &tmp[..n], write_timeout).await {
            debug!(target: "cachux::worker", error = ?e, "Client write failed during relay");
            break RelayEnd::ClientGone;
        }

        response.extend_from_slice(&tmp[..n]);
        body = response_body_state(&response, head_request);
        if body == ResponseBody::Complete {
            break RelayEnd::BodyComplete;
        }
    };

    debug!(
        target: "cachux::worker",
        origin = %origin.addr(),
        bytes = response.len(),
        end = ?end,
        body = ?body,
        "Relay finished"
    );

    Relayed {
        end,
        body,
        response,
    }
}
