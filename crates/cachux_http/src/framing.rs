//! Message boundaries on a byte stream.
//!
//! Only framing uses `httparse`; cache directives are still read by the
//! line scanners in [`crate::request`] and [`crate::response`]. When
//! `httparse` refuses a header block the `Content-Length` is recovered with
//! the same line scanner, so the message is never cut short.

use crate::lines::{has_header_name, next_line};

/// How much of a response body `buf` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseBody {
    /// Headers unfinished, or fewer body bytes than `Content-Length`.
    Partial,
    /// Declared body fully received, or the response has no body.
    Complete,
    /// No length declared; only the origin closing ends it.
    UntilClose,
}

/// Position just past the first `\r\n\r\n`, if present.
pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|pos| pos + 4)
}

/// Length of the first complete request in `buf`, or `None` if more bytes are
/// needed.
///
/// A request is complete once its header block has ended and any body
/// announced by `Content-Length` has arrived. Requests without a usable
/// `Content-Length` are taken to have no body.
pub fn request_frame_len(buf: &[u8]) -> Option<usize> {
    let head_end = find_headers_end(buf)?;
    let head = &buf[..head_end];

    let mut headers = vec![httparse::EMPTY_HEADER; header_slots(head)];
    let mut req = httparse::Request::new(&mut headers);
    let body_len = match req.parse(head) {
        Ok(httparse::Status::Complete(_)) => content_length(req.headers),
        _ => scan_content_length(head),
    }
    .unwrap_or(0);

    let total = head_end.checked_add(body_len)?;
    (buf.len() >= total).then_some(total)
}

/// Classifies the response accumulated in `buf`.
///
/// Answers to `HEAD` and `204`/`304` responses end with their headers,
/// whatever `Content-Length` they carry.
pub fn response_body_state(buf: &[u8], head_request: bool) -> ResponseBody {
    let Some(head_end) = find_headers_end(buf) else {
        return ResponseBody::Partial;
    };
    let head = &buf[..head_end];

    let mut headers = vec![httparse::EMPTY_HEADER; header_slots(head)];
    let mut resp = httparse::Response::new(&mut headers);
    let (status, declared) = match resp.parse(head) {
        Ok(httparse::Status::Complete(_)) => (resp.code, content_length(resp.headers)),
        _ => (scan_status(head), scan_content_length(head)),
    };

    if head_request || matches!(status, Some(204 | 304)) {
        return ResponseBody::Complete;
    }

    match declared {
        Some(len) if buf.len() - head_end >= len => ResponseBody::Complete,
        Some(_) => ResponseBody::Partial,
        None => ResponseBody::UntilClose,
    }
}

/// Upper bound on header lines in `head`.
fn header_slots(head: &[u8]) -> usize {
    head.iter().filter(|&&b| b == b'\n').count()
}

fn content_length(headers: &[httparse::Header<'_>]) -> Option<usize> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("content-length"))
        .and_then(|h| std::str::from_utf8(h.value).ok())
        .and_then(|v| v.trim().parse::<usize>().ok())
}

fn scan_content_length(head: &[u8]) -> Option<usize> {
    let mut rest = head;
    next_line(&mut rest)?;

    while let Some(line) = next_line(&mut rest) {
        if line.is_empty() {
            break;
        }
        let line = String::from_utf8_lossy(line);
        if has_header_name(&line, "Content-Length:") {
            return line["Content-Length:".len()..].trim().parse().ok();
        }
    }
    None
}

fn scan_status(head: &[u8]) -> Option<u16> {
    let mut rest = head;
    let line = String::from_utf8_lossy(next_line(&mut rest)?);
    line.split_whitespace().nth(1)?.parse().ok()
}
