use std::sync::Arc;

use cachux_config::CachuxConfig;
use tracing::{info, instrument};

use crate::ProxyRuntime;

mod accept;
mod stats;

pub use accept::accept_loop;
pub use stats::spawn_stats_reporter;

use accept::bind_listener;

pub struct Master {
    cfg: Arc<CachuxConfig>,
}

impl Master {
    pub fn new(cfg: CachuxConfig) -> Self {
        Self { cfg: Arc::new(cfg) }
    }

    /// Binds the listener, starts the stats reporter and serves connections
    /// until the accept loop fails.
    #[instrument(skip(self), fields(
        listen = %self.cfg.proxy.listen,
        capacity = self.cfg.cache.capacity,
    ))]
    pub async fn run(self) -> anyhow::Result<()> {
        self.log_startup();

        let runtime = Arc::new(ProxyRuntime::from_config(&self.cfg));
        let listener = bind_listener(self.cfg.proxy.listen()).await?;

        let _stats = spawn_stats_reporter(runtime.cache.clone(), self.cfg.cache.stats_interval());

        accept_loop(listener, runtime).await
    }

    fn log_startup(&self) {
        info!(target: "cachux::master", "Starting CACHUX MASTER");
        info!(
            target: "cachux::master",
            listen = %self.cfg.proxy.listen,
            capacity = self.cfg.cache.capacity,
            default_ttl_secs = self.cfg.cache.default_ttl_secs,
            log_level = %self.cfg.global.log_level,
            "Configuration loaded"
        );
    }
}
