/// Pops the next `\n`-terminated line off `rest`, without the terminator and
/// without a trailing `\r`. The final line may be unterminated.
pub(crate) fn next_line<'a>(rest: &mut &'a [u8]) -> Option<&'a [u8]> {
    if rest.is_empty() {
        return None;
    }

    let (line, tail) = match rest.iter().position(|&b| b == b'\n') {
        Some(pos) => (&rest[..pos], &rest[pos + 1..]),
        None => (*rest, &rest[rest.len()..]),
    };
    *rest = tail;

    Some(line.strip_suffix(b"\r").unwrap_or(line))
}

/// Case-insensitive check that `line` starts with the header `name`.
pub(crate) fn has_header_name(line: &str, name: &str) -> bool {
    line.len() >= name.len()
        && line.is_char_boundary(name.len())
        && line[..name.len()].eq_ignore_ascii_case(name)
}

#[cfg(test)]
mod tests {
    use super::{has_header_name, next_line};

    #[test]
    fn next_line_strips_crlf_and_keeps_tail() {
        let mut rest: &[u8] = b"GET / HTTP/1.1\r\nHost: a\r\n\r\nbody";
        assert_eq!(next_line(&mut rest), Some(&b"GET / HTTP/1.1"[..]));
        assert_eq!(next_line(&mut rest), Some(&b"Host: a"[..]));
        assert_eq!(next_line(&mut rest), Some(&b""[..]));
        assert_eq!(rest, b"body");
        assert_eq!(next_line(&mut rest), Some(&b"body"[..]));
        assert_eq!(next_line(&mut rest), None);
    }

    #[test]
    fn header_name_match_ignores_case() {
        assert!(has_header_name("cache-control: no-store", "Cache-Control:"));
        assert!(has_header_name("Expires: 0", "expires:"));
        assert!(!has_header_name("Exp", "Expires:"));
    }
}
