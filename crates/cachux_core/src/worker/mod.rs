//! Per-connection HTTP/1 handler.
//!
//! Reads client requests, answers cacheable ones from the shared cache, and
//! forwards the rest to their origin while respecting keep-alive and timeouts.

use std::{net::SocketAddr, sync::Arc};

use bytes::{Bytes, BytesMut};
use cachux_cache::{CacheKey, CacheLookup};
use cachux_http::responses::{send_405, send_502, send_bad_request};
use cachux_http::{parse_request, parse_response, HttpRequest};
use cachux_proxy::Resolver;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, instrument, warn};

use crate::ProxyRuntime;

mod relay;
mod request;
mod timeouts;

use relay::{relay_response, RelayEnd};
use request::read_request;
use timeouts::write_all_timeout;

pub trait ClientStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> ClientStream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// What to do with the connection once a request has been answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

/// Entry point for a "logical worker" that handles a single connection.
#[instrument(
    skip(stream, runtime),
    fields(
        client = %client_addr,
    )
)]
pub async fn handle_connection<R: Resolver>(
    mut stream: Box<dyn ClientStream>,
    client_addr: SocketAddr,
    runtime: Arc<ProxyRuntime<R>>,
) -> anyhow::Result<()> {
    info!(target: "cachux::worker", "Handling new client connection");

    let limits = runtime.limits;
    let mut buf = BytesMut::new();

    loop {
        // 1) Read one HTTP request (headers + Content-Length body)
        let raw = match read_request(
            &mut *stream,
            &mut buf,
            limits.read_buffer_bytes,
            limits.read_timeout,
        )
        .await?
        {
            Some(raw) => raw,
            None => break,
        };

        // 2) Parse and reject what we never forward
        let req = parse_request(&raw);
        debug!(
            target: "cachux::worker",
            method = %req.method,
            url = %req.url,
            host = %req.host,
            "Parsed HTTP request line"
        );

        if req.is_connect() {
            warn!(target: "cachux::worker", url = %req.url, "CONNECT is not supported");
            send_405(&mut *stream).await?;
            break;
        }

        if !req.is_valid {
            warn!(target: "cachux::worker", "Malformed request line");
            send_bad_request(&mut *stream).await?;
            break;
        }

        // 3) Serve from cache or forward
        let keep_alive = req.wants_keep_alive();
        if serve_request(&mut *stream, &req, raw, &runtime).await? == Flow::Close {
            break;
        }

        if !keep_alive {
            break;
        }
    }

    info!(target: "cachux::worker", "Finished handling connection");

    Ok(())
}

async fn serve_request<R: Resolver>(
    stream: &mut dyn ClientStream,
    req: &HttpRequest,
    raw: Bytes,
    runtime: &ProxyRuntime<R>,
) -> anyhow::Result<Flow> {
    let limits = runtime.limits;
    let key = CacheKey::new(&req.method, &req.host, &req.url);

    if req.is_cacheable {
        match runtime.cache.lookup(&key) {
            CacheLookup::Hit(cached) => {
                debug!(target: "cachux::worker", %key, bytes = cached.len(), "Serving from cache");
                if let Err(e) = write_all_timeout(stream, &cached, limits.write_timeout).await {
                    debug!(target: "cachux::worker", error = ?e, "Client write failed");
                    return Ok(Flow::Close);
                }
                return Ok(Flow::Continue);
            }
            CacheLookup::Expired => {
                debug!(target: "cachux::worker", %key, "Cached response expired");
            }
            CacheLookup::Miss => {}
        }
    }

    // 4) Connect to the origin
    let authority = req.origin_authority().unwrap_or_default();
    let mut origin = match runtime.connector.connect(authority).await {
        Ok(origin) => origin,
        Err(e) => {
            warn!(
                target: "cachux::worker",
                %authority,
                error = %e,
                resolution = e.is_resolution(),
                "Failed to reach origin"
            );
            send_502(stream).await?;
            return Ok(Flow::Close);
        }
    };

    if let Err(e) = origin.send(&raw).await {
        warn!(
            target: "cachux::worker",
            origin = %origin.addr(),
            error = ?e,
            "Failed to forward request to origin"
        );
        return Ok(Flow::Close);
    }

    // 5) Relay the response and remember it if it may be reused
    let relayed = relay_response(
        &mut origin,
        stream,
        req.method == "HEAD",
        limits.read_buffer_bytes,
        limits.write_timeout,
    )
    .await;

    let complete = relayed.is_complete();
    let end = relayed.end;
    if req.is_cacheable && complete {
        store_response(runtime, key, relayed.response.freeze());
    }

    match end {
        RelayEnd::ClientGone | RelayEnd::OriginError => Ok(Flow::Close),
        RelayEnd::OriginClosed | RelayEnd::BodyComplete | RelayEnd::OriginTimeout => {
            Ok(Flow::Continue)
        }
    }
}

fn store_response<R: Resolver>(runtime: &ProxyRuntime<R>, key: CacheKey, raw: Bytes) {
    match parse_response(&raw) {
        Ok(resp) if resp.is_cacheable => {
            runtime.cache.insert(key, resp.raw, resp.max_age);
        }
        Ok(resp) => {
            debug!(
                target: "cachux::worker",
                %key,
                status = %resp.status_line,
                "Response not cacheable"
            );
        }
        Err(e) => {
            debug!(target: "cachux::worker", %key, error = %e, "Response not cached");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use cachux_cache::{CacheKey, MemoryCacheStore};
    use cachux_http::request_frame_len;
    use cachux_proxy::{ConnectError, ConnectorTimeouts, Resolver, StaticResolver, TargetConnector};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::time::{Duration, Instant};

    use super::handle_connection;
    use crate::{ClientLimits, ProxyRuntime};

    const OK_RESPONSE: &[u8] =
        b"HTTP/1.1 200 OK\r\nCache-Control: max-age=60\r\nContent-Length: 5\r\n\r\nhello";

    struct CountingResolver {
        inner: StaticResolver,
        calls: Arc<AtomicUsize>,
    }

    impl Resolver for CountingResolver {
        async fn resolve(&self, host: &str, port: u16) -> Result<SocketAddr, ConnectError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.resolve(host, port).await
        }
    }

    fn runtime<R: Resolver>(resolver: R) -> Arc<ProxyRuntime<R>> {
        runtime_with(resolver, Duration::from_millis(300))
    }

    fn runtime_with<R: Resolver>(resolver: R, origin_read: Duration) -> Arc<ProxyRuntime<R>> {
        let quick = Duration::from_millis(300);
        let timeouts = ConnectorTimeouts {
            connect: quick,
            read: origin_read,
            write: quick,
        };
        let limits = ClientLimits {
            read_timeout: quick,
            write_timeout: quick,
            read_buffer_bytes: 1024,
        };
        Arc::new(ProxyRuntime::new(
            Arc::new(MemoryCacheStore::new(4, Duration::from_secs(300))),
            TargetConnector::new(resolver, timeouts, 80),
            limits,
        ))
    }

    /// What the test origin does with the socket after replying.
    #[derive(Clone, Copy)]
    enum AfterReply {
        Close,
        Hold,
        Reset,
    }

    struct TestOrigin {
        addr: SocketAddr,
        accepted: Arc<AtomicUsize>,
        received: Arc<Mutex<Vec<u8>>>,
    }

    /// Origin that answers each connection's first request with `response`,
    /// then closes.
    async fn spawn_origin(response: &'static [u8]) -> (SocketAddr, Arc<AtomicUsize>) {
        let origin = spawn_origin_with(response, AfterReply::Close).await;
        (origin.addr, origin.accepted)
    }

    async fn spawn_origin_with(response: &'static [u8], after: AfterReply) -> TestOrigin {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(Mutex::new(Vec::new()));
        let counter = accepted.clone();
        let sink = received.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut sock, _)) = listener.accept().await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let sink = sink.clone();
                tokio::spawn(async move {
                    let mut seen = Vec::new();
                    let mut tmp = [0u8; 1024];
                    while request_frame_len(&seen).is_none() {
                        match sock.read(&mut tmp).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => seen.extend_from_slice(&tmp[..n]),
                        }
                    }
                    sink.lock().unwrap().extend_from_slice(&seen);

                    let _ = sock.write_all(response).await;
                    match after {
                        AfterReply::Close => {}
                        AfterReply::Hold => tokio::time::sleep(Duration::from_secs(10)).await,
                        AfterReply::Reset => {
                            #[allow(deprecated)]
                            let _ = sock.set_linger(Some(Duration::ZERO));
                        }
                    }
                });
            }
        });

        TestOrigin {
            addr,
            accepted,
            received,
        }
    }

    /// Sends `input`, half-closes, and collects everything the proxy wrote.
    async fn exchange<R: Resolver>(runtime: Arc<ProxyRuntime<R>>, input: &[u8]) -> Vec<u8> {
        let (mut client, server) = tokio::io::duplex(64 * 1024);
        let peer: SocketAddr = "127.0.0.1:50000".parse().unwrap();
        let task = tokio::spawn(handle_connection(Box::new(server), peer, runtime));

        client.write_all(input).await.unwrap();
        client.shutdown().await.unwrap();

        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();
        task.await.unwrap().unwrap();
        out
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[tokio::test]
    async fn connect_gets_single_405_without_resolving() {
        let calls = Arc::new(AtomicUsize::new(0));
        let rt = runtime(CountingResolver {
            inner: StaticResolver::new(),
            calls: calls.clone(),
        });

        let out = exchange(
            rt,
            b"CONNECT example.com:443 HTTP/1.1\r\nHost: example.com:443\r\n\r\n",
        )
        .await;

        assert_eq!(out, b"HTTP/1.1 405 Method Not Allowed\r\n\r\n");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_request_line_gets_404_bad_request() {
        let out = exchange(runtime(StaticResolver::new()), b"GET\r\n\r\n").await;
        assert_eq!(out, b"HTTP/1.1 404 Bad Request\r\n\r\n");
    }

    #[tokio::test]
    async fn unresolvable_host_gets_502_and_cache_is_untouched() {
        let rt = runtime(StaticResolver::new());
        let out = exchange(
            rt.clone(),
            b"GET /x HTTP/1.1\r\nHost: nowhere.test\r\n\r\n",
        )
        .await;

        assert_eq!(out, b"HTTP/1.1 502 Bad gateway\r\n\r\n");
        let stats = rt.cache.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.insertions, 0);
    }

    #[tokio::test]
    async fn repeat_request_is_served_from_cache() {
        let (origin, accepted) = spawn_origin(OK_RESPONSE).await;
        let rt = runtime(StaticResolver::new().with_host("origin.test", origin));

        let req: &[u8] = b"GET /page HTTP/1.1\r\nHost: origin.test\r\nConnection: keep-alive\r\n\r\n";
        let out = exchange(rt.clone(), &[req, req].concat()).await;

        assert_eq!(out, [OK_RESPONSE, OK_RESPONSE].concat());
        assert_eq!(accepted.load(Ordering::SeqCst), 1);

        let stats = rt.cache.stats();
        assert_eq!(stats.hits, 1);
        assert!(rt.cache.contains(&CacheKey::new("GET", "origin.test", "/page")));
    }

    #[tokio::test]
    async fn keep_alive_answers_every_pipelined_request() {
        let (origin, accepted) = spawn_origin(OK_RESPONSE).await;
        let rt = runtime(StaticResolver::new().with_host("origin.test", origin));

        let input = b"GET /a HTTP/1.1\r\nHost: origin.test\r\nConnection: keep-alive\r\n\r\n\
                      GET /b HTTP/1.1\r\nHost: origin.test\r\nConnection: keep-alive\r\n\r\n";
        let out = exchange(rt, input).await;

        assert_eq!(count(&out, b"HTTP/1.1 200 OK"), 2);
        assert_eq!(accepted.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn http10_closes_after_first_response() {
        let (origin, accepted) = spawn_origin(OK_RESPONSE).await;
        let rt = runtime(StaticResolver::new().with_host("origin.test", origin));

        let input = b"GET /a HTTP/1.0\r\nHost: origin.test\r\nConnection: keep-alive\r\n\r\n\
                      GET /b HTTP/1.0\r\nHost: origin.test\r\n\r\n";
        let out = exchange(rt, input).await;

        assert_eq!(out, OK_RESPONSE);
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_cache_request_bypasses_cache() {
        let (origin, accepted) = spawn_origin(OK_RESPONSE).await;
        let rt = runtime(StaticResolver::new().with_host("origin.test", origin));

        let req: &[u8] = b"GET /p HTTP/1.1\r\nHost: origin.test\r\nCache-Control: no-cache\r\nConnection: keep-alive\r\n\r\n";
        let out = exchange(rt.clone(), &[req, req].concat()).await;

        assert_eq!(count(&out, b"hello"), 2);
        assert_eq!(accepted.load(Ordering::SeqCst), 2);
        assert_eq!(rt.cache.stats().entries, 0);
    }

    #[tokio::test]
    async fn uncacheable_response_is_relayed_but_not_stored() {
        let (origin, _) = spawn_origin(
            b"HTTP/1.1 200 OK\r\nCache-Control: no-store\r\nContent-Length: 2\r\n\r\nok",
        )
        .await;
        let rt = runtime(StaticResolver::new().with_host("origin.test", origin));

        let out = exchange(rt.clone(), b"GET / HTTP/1.1\r\nHost: origin.test\r\n\r\n").await;

        assert!(out.ends_with(b"\r\n\r\nok"));
        assert_eq!(rt.cache.stats().entries, 0);
    }

    #[tokio::test]
    async fn open_ended_response_is_cached_after_origin_goes_quiet() {
        const OPEN_ENDED: &[u8] = b"HTTP/1.1 200 OK\r\nCache-Control: max-age=60\r\n\r\nhello";
        let origin = spawn_origin_with(OPEN_ENDED, AfterReply::Hold).await;
        let rt = runtime(StaticResolver::new().with_host("origin.test", origin.addr));

        let out = exchange(
            rt.clone(),
            b"GET /stream HTTP/1.1\r\nHost: origin.test\r\nConnection: keep-alive\r\n\r\n",
        )
        .await;

        assert_eq!(out, OPEN_ENDED);
        assert_eq!(rt.cache.stats().entries, 1);
        assert!(rt.cache.contains(&CacheKey::new("GET", "origin.test", "/stream")));
    }

    #[tokio::test]
    async fn client_gone_mid_relay_is_not_cached() {
        let origin = spawn_origin_with(OK_RESPONSE, AfterReply::Close).await;
        let rt = runtime(StaticResolver::new().with_host("origin.test", origin.addr));

        let (mut client, server) = tokio::io::duplex(64 * 1024);
        let peer: SocketAddr = "127.0.0.1:50000".parse().unwrap();
        client
            .write_all(b"GET /gone HTTP/1.1\r\nHost: origin.test\r\n\r\n")
            .await
            .unwrap();
        drop(client);

        handle_connection(Box::new(server), peer, rt.clone()).await.unwrap();

        assert_eq!(origin.accepted.load(Ordering::SeqCst), 1);
        assert_eq!(rt.cache.stats().entries, 0);
    }

    #[tokio::test]
    async fn origin_reset_mid_body_is_not_cached() {
        let origin = spawn_origin_with(
            b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial",
            AfterReply::Reset,
        )
        .await;
        let rt = runtime(StaticResolver::new().with_host("origin.test", origin.addr));

        exchange(rt.clone(), b"GET /cut HTTP/1.1\r\nHost: origin.test\r\n\r\n").await;

        assert_eq!(origin.accepted.load(Ordering::SeqCst), 1);
        let stats = rt.cache.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.insertions, 0);
    }

    #[tokio::test]
    async fn head_response_ends_at_headers() {
        const HEAD_REPLY: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 512\r\n\r\n";
        let origin = spawn_origin_with(HEAD_REPLY, AfterReply::Hold).await;
        let rt = runtime_with(
            StaticResolver::new().with_host("origin.test", origin.addr),
            Duration::from_secs(5),
        );

        let started = Instant::now();
        let out = exchange(
            rt,
            b"HEAD /big HTTP/1.1\r\nHost: origin.test\r\nConnection: keep-alive\r\n\r\n",
        )
        .await;

        assert_eq!(out, HEAD_REPLY);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn request_with_many_headers_reaches_origin_whole() {
        let origin = spawn_origin_with(OK_RESPONSE, AfterReply::Close).await;
        let rt = runtime(StaticResolver::new().with_host("origin.test", origin.addr));

        let mut request = b"POST /upload HTTP/1.1\r\nHost: origin.test\r\nContent-Length: 4\r\n".to_vec();
        for i in 0..70 {
            request.extend_from_slice(format!("X-H{i}: v\r\n").as_bytes());
        }
        request.extend_from_slice(b"\r\nbody");

        let out = exchange(rt, &request).await;

        assert_eq!(out, OK_RESPONSE);
        assert_eq!(*origin.received.lock().unwrap(), request);
    }

    #[tokio::test]
    async fn requests_differing_only_in_headers_share_an_entry() {
        let (origin, accepted) = spawn_origin(OK_RESPONSE).await;
        let rt = runtime(StaticResolver::new().with_host("origin.test", origin));

        let input = b"GET /same HTTP/1.1\r\nHost: origin.test\r\nUser-Agent: first\r\nConnection: keep-alive\r\n\r\n\
                      GET /same HTTP/1.1\r\nHost: origin.test\r\nUser-Agent: second\r\nAccept: */*\r\nConnection: keep-alive\r\n\r\n";
        let out = exchange(rt.clone(), input).await;

        assert_eq!(out, [OK_RESPONSE, OK_RESPONSE].concat());
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
        assert_eq!(rt.cache.stats().hits, 1);
    }
}
