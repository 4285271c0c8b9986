use std::fmt;

/// Cache fingerprint: method, host and URL, nothing else.
///
/// Headers, bodies and query ordering play no part, so two requests with the
/// same triple always share one entry.
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub struct CacheKey {
    pub method: String,
    pub host: String,
    pub url: String,
}

impl CacheKey {
    pub fn new(method: &str, host: &str, url: &str) -> Self {
        Self {
            method: method.to_string(),
            host: host.to_string(),
            url: url.to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}{}", self.method, self.host, self.url)
    }
}
