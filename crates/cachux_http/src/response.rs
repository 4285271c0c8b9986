use bytes::Bytes;
use thiserror::Error;

use crate::lines::{has_header_name, next_line};

/// An origin response, classified for caching.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status_line: String,
    pub headers: Vec<String>,
    pub body: Bytes,
    /// The response exactly as received, replayed verbatim on cache hits.
    pub raw: Bytes,
    pub is_cacheable: bool,
    /// Declared `max-age` in seconds; 0 when the origin did not send one.
    pub max_age: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResponseParseError {
    #[error("invalid max-age value {value:?}")]
    InvalidMaxAge { value: String },
}

/// Parses and classifies an origin response.
///
/// Header rules are applied in order and each one overwrites the previous
/// verdict, so an `Expires` after a `no-cache` makes the response cacheable
/// again while the reverse order does not.
pub fn parse_response(raw: &[u8]) -> Result<HttpResponse, ResponseParseError> {
    let mut resp = HttpResponse {
        raw: Bytes::copy_from_slice(raw),
        ..HttpResponse::default()
    };
    let mut rest = raw;

    if let Some(line) = next_line(&mut rest) {
        resp.status_line = String::from_utf8_lossy(line).into_owned();
        resp.is_cacheable = resp.status_line.contains("200 OK");
    }

    while let Some(line) = next_line(&mut rest) {
        if line.is_empty() {
            break;
        }
        let line = String::from_utf8_lossy(line).into_owned();

        if has_header_name(&line, "Cache-Control:") {
            if line.contains("no-cache") || line.contains("no-store") {
                resp.is_cacheable = false;
            }
            if let Some(idx) = line.find("max-age=") {
                let value = &line[idx + "max-age=".len()..];
                let value = value.split(',').next().unwrap_or_default();
                resp.max_age = parse_seconds(value)?;
            }
        }

        if has_header_name(&line, "Expires:") {
            resp.is_cacheable = true;
        }

        resp.headers.push(line);
    }

    resp.body = Bytes::copy_from_slice(rest);
    Ok(resp)
}

/// Leading-integer parse: surrounding whitespace and trailing junk after the
/// digits are tolerated, a value without digits is not.
fn parse_seconds(raw: &str) -> Result<i64, ResponseParseError> {
    let trimmed = raw.trim_start();
    let sign_len = usize::from(trimmed.starts_with(['-', '+']));
    let digits_len = trimmed[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();

    let invalid = || ResponseParseError::InvalidMaxAge {
        value: raw.trim().to_string(),
    };

    if digits_len == 0 {
        return Err(invalid());
    }
    trimmed[..sign_len + digits_len]
        .parse::<i64>()
        .map_err(|_| invalid())
}
