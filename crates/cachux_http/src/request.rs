use bytes::Bytes;

use crate::lines::{has_header_name, next_line};

/// A client request as seen by the proxy.
///
/// Header lines are kept in arrival order and un-normalised; flags are
/// computed once at parse time.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub version: String,
    /// Value of the `Host` header, empty when absent.
    pub host: String,
    pub headers: Vec<String>,
    pub body: Bytes,
    /// Method and URL are both present.
    pub is_valid: bool,
    /// `GET` without a `Cache-Control: no-cache` request header.
    pub is_cacheable: bool,
}

impl HttpRequest {
    pub fn is_connect(&self) -> bool {
        self.method == "CONNECT"
    }

    /// True when the client asked to reuse the connection.
    ///
    /// Requires an explicit `Connection: keep-alive`; HTTP/1.0 always closes.
    pub fn wants_keep_alive(&self) -> bool {
        if self.version == "HTTP/1.0" {
            return false;
        }
        self.headers.iter().any(|line| {
            has_header_name(line, "Connection:") && line.to_ascii_lowercase().contains("keep-alive")
        })
    }

    /// `host[:port]` to connect to.
    ///
    /// The `Host` header wins; absolute-form URLs (`http://host:port/path`)
    /// are used when it is missing.
    pub fn origin_authority(&self) -> Option<&str> {
        if !self.host.is_empty() {
            return Some(self.host.as_str());
        }

        let rest = self.url.strip_prefix("http://")?;
        let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
        if authority.is_empty() {
            None
        } else {
            Some(authority)
        }
    }
}

/// Parses a raw request.
///
/// Never fails: an unusable request line simply produces `is_valid == false`.
pub fn parse_request(raw: &[u8]) -> HttpRequest {
    let mut req = HttpRequest::default();
    let mut rest = raw;

    if let Some(line) = next_line(&mut rest) {
        let line = String::from_utf8_lossy(line);
        let mut parts = line.split_whitespace();
        req.method = parts.next().unwrap_or_default().to_string();
        req.url = parts.next().unwrap_or_default().to_string();
        req.version = parts.next().unwrap_or_default().to_string();

        req.is_valid = !req.method.is_empty() && !req.url.is_empty();
        req.is_cacheable = req.method == "GET";
    }

    while let Some(line) = next_line(&mut rest) {
        if line.is_empty() {
            break;
        }
        let line = String::from_utf8_lossy(line).into_owned();

        if has_header_name(&line, "Host:") {
            let value = &line["Host:".len()..];
            req.host = value.strip_prefix(' ').unwrap_or(value).to_string();
        }

        // Deliberately case-sensitive: matches what clients actually send.
        if line.starts_with("Cache-Control") && line.contains("no-cache") {
            req.is_cacheable = false;
        }

        req.headers.push(line);
    }

    req.body = Bytes::copy_from_slice(rest);
    req
}
