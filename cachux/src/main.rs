use cachux_config::CachuxConfig;
use cachux_core::master::Master;
use tracing::info;
use utils::init_tracing;

const DEFAULT_CONFIG_PATH: &str = "cachux.conf";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let cfg = CachuxConfig::from_file_or_default(&path);
    init_tracing(cfg.global.log_level());
    cfg.print();

    info!(target: "cachux::master", config = %path, "Configuration ready");

    Master::new(cfg).run().await
}
