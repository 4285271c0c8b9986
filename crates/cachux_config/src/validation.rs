use std::net::SocketAddr;

use crate::CachuxConfig;

const MIN_READ_BUFFER_BYTES: usize = 1024;
const LARGE_CACHE_CAPACITY: usize = 100_000;

/// Validation output for a loaded Cachux configuration.
#[derive(Debug, Default)]
pub struct ConfigReport {
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl ConfigReport {
    /// Returns true when no errors were found.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Render warnings and errors into a readable, multi-line string.
    pub fn format(&self) -> String {
        let mut out = String::new();
        if !self.errors.is_empty() {
            out.push_str("Errors:\n");
            for err in &self.errors {
                out.push_str("  - ");
                out.push_str(err);
                out.push('\n');
            }
        }
        if !self.warnings.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("Warnings:\n");
            for warn in &self.warnings {
                out.push_str("  - ");
                out.push_str(warn);
                out.push('\n');
            }
        }
        out
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

/// Validate a Cachux configuration and return a report of issues.
pub fn validate(cfg: &CachuxConfig) -> ConfigReport {
    let mut report = ConfigReport::default();

    validate_proxy(cfg, &mut report);
    validate_cache(cfg, &mut report);

    report
}

fn validate_proxy(cfg: &CachuxConfig, report: &mut ConfigReport) {
    let listen = cfg.proxy.listen.trim();
    if listen.parse::<SocketAddr>().is_err() {
        report.error(format!(
            "proxy.listen '{listen}' is not a valid socket address (expected ip:port)"
        ));
    }

    if cfg.proxy.read_buffer_bytes < MIN_READ_BUFFER_BYTES {
        report.warn(format!(
            "proxy.read_buffer_bytes is {}; reads below {MIN_READ_BUFFER_BYTES} bytes fragment relays",
            cfg.proxy.read_buffer_bytes
        ));
    }
}

fn validate_cache(cfg: &CachuxConfig, report: &mut ConfigReport) {
    if cfg.cache.capacity > LARGE_CACHE_CAPACITY {
        report.warn(format!(
            "cache.capacity is {}; every entry holds a full response in memory",
            cfg.cache.capacity
        ));
    }
}

#[cfg(test)]
mod tests {
    use crate::CachuxConfig;

    #[test]
    fn default_config_is_valid() {
        let report = CachuxConfig::default().validate();
        assert!(report.is_ok());
        assert!(report.warnings().is_empty());
    }

    #[test]
    fn bad_listen_is_an_error() {
        let mut cfg = CachuxConfig::default();
        cfg.proxy.listen = "localhost".into();
        let report = cfg.validate();
        assert!(report.has_errors());
        assert!(report.format().contains("proxy.listen"));
    }

    #[test]
    fn tiny_read_buffer_warns() {
        let mut cfg = CachuxConfig::default();
        cfg.proxy.read_buffer_bytes = 16;
        let report = cfg.validate();
        assert!(report.is_ok());
        assert_eq!(report.warnings().len(), 1);
        assert!(report.format().starts_with("Warnings:"));
    }
}
