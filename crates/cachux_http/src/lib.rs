//! Minimal HTTP/1.x codec for the proxy.
//!
//! Parsing is line-oriented on purpose: header directives are applied in the
//! order they appear, and the raw bytes are kept so cached responses can be
//! replayed byte-for-byte.

pub mod framing;
mod lines;
pub mod request;
pub mod response;
pub mod responses;

pub use framing::{request_frame_len, response_body_state, ResponseBody};
pub use request::{parse_request, HttpRequest};
pub use response::{parse_response, HttpResponse, ResponseParseError};
