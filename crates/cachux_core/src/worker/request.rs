use bytes::{Bytes, BytesMut};
use cachux_http::request_frame_len;
use tokio::time::Duration;
use tracing::debug;

use super::timeouts::{read_more, ReadOutcome};
use super::ClientStream;

/// Reads until `buf` starts with one complete request and splits it off.
///
/// Bytes past the request stay in `buf` for the next cycle. Returns `None`
/// when the client disconnects or stays silent past `read_timeout`.
pub(crate) async fn read_request(
    stream: &mut dyn ClientStream,
    buf: &mut BytesMut,
    chunk: usize,
    read_timeout: Duration,
) -> anyhow::Result<Option<Bytes>> {
    loop {
        if let Some(len) = request_frame_len(buf) {
            return Ok(Some(buf.split_to(len).freeze()));
        }

        match read_more(stream, buf, chunk, read_timeout).await? {
            ReadOutcome::Timeout => {
                debug!(
                    target: "cachux::worker",
                    buffered = buf.len(),
                    "Client read timed out"
                );
                return Ok(None);
            }
            ReadOutcome::Read(0) => {
                debug!(
                    target: "cachux::worker",
                    buffered = buf.len(),
                    "Client closed connection"
                );
                return Ok(None);
            }
            ReadOutcome::Read(_) => {}
        }
    }
}
