use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Helper to send a bare status line (no headers, no body).
pub async fn send_status_line<W>(stream: &mut W, status: &str) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let response = format!("HTTP/1.1 {status}\r\n\r\n");
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

pub async fn send_405<W>(stream: &mut W) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    send_status_line(stream, "405 Method Not Allowed").await
}

/// Malformed request line. The 404 code is what existing clients of this
/// proxy have always received, despite the reason phrase.
pub async fn send_bad_request<W>(stream: &mut W) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    send_status_line(stream, "404 Bad Request").await
}

pub async fn send_502<W>(stream: &mut W) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    send_status_line(stream, "502 Bad gateway").await
}
