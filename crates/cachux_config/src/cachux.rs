use serde::Deserialize;

use crate::validation::{validate, ConfigReport};
use crate::{CacheConfig, GlobalConfig, ProxyConfig};

/// Prefix for environment overrides, e.g. `CACHUX__PROXY__LISTEN`.
const ENV_PREFIX: &str = "CACHUX";

// =======================================================
// CACHUX CONFIG: main config
// =======================================================
#[derive(Debug, Clone, Deserialize)]
pub struct CachuxConfig {
    #[serde(default)]
    pub global: GlobalConfig,

    #[serde(default)]
    pub proxy: ProxyConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

impl Default for CachuxConfig {
    fn default() -> Self {
        let mut cfg = Self {
            global: GlobalConfig::default(),
            proxy: ProxyConfig::default(),
            cache: CacheConfig::default(),
        };
        cfg.apply_defaults();
        cfg
    }
}

impl CachuxConfig {
    /// Validate the configuration and return a report of warnings and errors.
    pub fn validate(&self) -> ConfigReport {
        validate(self)
    }

    /// Loads `file_name` (TOML, optional) with environment overrides on top.
    pub fn from_file(file_name: &str) -> Result<Self, config::ConfigError> {
        let built = config::Config::builder()
            .add_source(config::File::new(file_name, config::FileFormat::Toml).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_built(built)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, config::ConfigError> {
        let built = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?;

        Self::from_built(built)
    }

    fn from_built(built: config::Config) -> Result<Self, config::ConfigError> {
        let mut cfg: CachuxConfig = built.try_deserialize()?;
        cfg.apply_defaults();
        Ok(cfg)
    }

    pub fn from_file_or_default(file_name: &str) -> Self {
        match Self::from_file(file_name) {
            Ok(cfg) => {
                let report = cfg.validate();
                if report.has_errors() {
                    eprintln!("Invalid config in '{file_name}':");
                    eprintln!("{}", report.format());
                    eprintln!("Using default config (in-memory)...");
                    CachuxConfig::default()
                } else {
                    if !report.warnings().is_empty() {
                        eprintln!("Config warnings in '{file_name}':");
                        eprintln!("{}", report.format());
                    }
                    cfg
                }
            }
            Err(e) => {
                eprintln!("Error reading config '{file_name}': {e}");
                eprintln!("Using default config (in-memory)...");
                CachuxConfig::default()
            }
        }
    }

    fn apply_defaults(&mut self) {
        self.global.apply_defaults_from(&GlobalConfig::default());
        self.proxy.apply_defaults_from(&ProxyConfig::default());
        self.cache.apply_defaults_from(&CacheConfig::default());
    }

    pub fn print(&self) {
        println!("================ CACHUX CONFIG ================");
        println!("\n[global]");
        println!("  log_level                   = {}", self.global.log_level);

        println!("\n[proxy]");
        println!("  listen                      = {}", self.proxy.listen);
        println!(
            "  client_read_timeout_secs    = {}",
            self.proxy.client_read_timeout_secs
        );
        println!(
            "  client_write_timeout_secs   = {}",
            self.proxy.client_write_timeout_secs
        );
        println!(
            "  origin_connect_timeout_secs = {}",
            self.proxy.origin_connect_timeout_secs
        );
        println!(
            "  origin_read_timeout_secs    = {}",
            self.proxy.origin_read_timeout_secs
        );
        println!(
            "  origin_write_timeout_secs   = {}",
            self.proxy.origin_write_timeout_secs
        );
        println!(
            "  default_origin_port         = {}",
            self.proxy.default_origin_port
        );
        println!("  read_buffer_bytes           = {}", self.proxy.read_buffer_bytes);

        println!("\n[cache]");
        println!("  capacity                    = {}", self.cache.capacity);
        println!("  default_ttl_secs            = {}", self.cache.default_ttl_secs);
        println!("  stats_interval_secs         = {}", self.cache.stats_interval_secs);
        println!("===============================================");
    }
}
