use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt, AsyncReadExt};
use tokio::time::{Duration, timeout};

use super::ClientStream;

pub(crate) enum ReadOutcome {
    Read(usize),
    Timeout,
}

/// One bounded read from the client, appended to `buf`.
pub(crate) async fn read_more(
    stream: &mut dyn ClientStream,
    buf: &mut BytesMut,
    chunk: usize,
    timeout_dur: Duration,
) -> anyhow::Result<ReadOutcome> {
    buf.reserve(chunk);
    match timeout(timeout_dur, stream.read_buf(buf)).await {
        Ok(res) => Ok(ReadOutcome::Read(res?)),
        Err(_) => Ok(ReadOutcome::Timeout),
    }
}

/// Writes all of `bytes` to the client and flushes, bounded by `timeout_dur`.
pub(crate) async fn write_all_timeout<W>(
    stream: &mut W,
    bytes: &[u8],
    timeout_dur: Duration,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let write = async {
        stream.write_all(bytes).await?;
        stream.flush().await
    };
    match timeout(timeout_dur, write).await {
        Ok(res) => res,
        Err(_) => Err(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "write to client timed out",
        )),
    }
}
