use std::time::Duration;

use serde::Deserialize;

// =======================================================
// PROXY CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub listen: String,

    // Timeouts (seconds)
    pub client_read_timeout_secs: u64,
    pub client_write_timeout_secs: u64,
    pub origin_connect_timeout_secs: u64,
    pub origin_read_timeout_secs: u64,
    pub origin_write_timeout_secs: u64,

    /// Port used when the Host header carries none.
    pub default_origin_port: u16,
    /// Size of a single socket read.
    pub read_buffer_bytes: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".into(),
            client_read_timeout_secs: 5,
            client_write_timeout_secs: 5,
            origin_connect_timeout_secs: 5,
            origin_read_timeout_secs: 5,
            origin_write_timeout_secs: 5,
            default_origin_port: 80,
            read_buffer_bytes: 8192,
        }
    }
}

impl ProxyConfig {
    pub fn listen(&self) -> &str {
        &self.listen
    }

    pub fn client_read_timeout(&self) -> Duration {
        Duration::from_secs(self.client_read_timeout_secs)
    }

    pub fn client_write_timeout(&self) -> Duration {
        Duration::from_secs(self.client_write_timeout_secs)
    }

    pub fn origin_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.origin_connect_timeout_secs)
    }

    pub fn origin_read_timeout(&self) -> Duration {
        Duration::from_secs(self.origin_read_timeout_secs)
    }

    pub fn origin_write_timeout(&self) -> Duration {
        Duration::from_secs(self.origin_write_timeout_secs)
    }

    pub fn default_origin_port(&self) -> u16 {
        self.default_origin_port
    }

    pub fn read_buffer_bytes(&self) -> usize {
        self.read_buffer_bytes
    }

    pub(crate) fn apply_defaults_from(&mut self, defaults: &ProxyConfig) {
        if self.listen.is_empty() {
            self.listen = defaults.listen.clone();
        }
        if self.client_read_timeout_secs == 0 {
            self.client_read_timeout_secs = defaults.client_read_timeout_secs;
        }
        if self.client_write_timeout_secs == 0 {
            self.client_write_timeout_secs = defaults.client_write_timeout_secs;
        }
        if self.origin_connect_timeout_secs == 0 {
            self.origin_connect_timeout_secs = defaults.origin_connect_timeout_secs;
        }
        if self.origin_read_timeout_secs == 0 {
            self.origin_read_timeout_secs = defaults.origin_read_timeout_secs;
        }
        if self.origin_write_timeout_secs == 0 {
            self.origin_write_timeout_secs = defaults.origin_write_timeout_secs;
        }
        if self.default_origin_port == 0 {
            self.default_origin_port = defaults.default_origin_port;
        }
        if self.read_buffer_bytes == 0 {
            self.read_buffer_bytes = defaults.read_buffer_bytes;
        }
    }
}
