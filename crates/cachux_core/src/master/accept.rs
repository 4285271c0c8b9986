use std::sync::Arc;

use cachux_proxy::Resolver;
use tokio::net::TcpListener;
use tracing::{debug, error, info, instrument, warn};

use crate::{worker::handle_connection, ProxyRuntime};

pub(crate) async fn bind_listener(listen_addr: &str) -> anyhow::Result<TcpListener> {
    info!(
        target: "cachux::master",
        listen = %listen_addr,
        "Binding listener"
    );

    match TcpListener::bind(listen_addr).await {
        Ok(listener) => {
            info!(
                target: "cachux::master",
                listen = %listen_addr,
                "Bind() successful"
            );
            Ok(listener)
        }
        Err(e) => {
            error!(
                target: "cachux::master",
                listen = %listen_addr,
                error = ?e,
                "Failed to bind listener"
            );
            Err(e.into())
        }
    }
}

/// Accepts connections forever, one detached task per client.
///
/// A failed accept is logged and skipped; it never stops the loop.
#[instrument(skip(listener, runtime))]
pub async fn accept_loop<R: Resolver>(
    listener: TcpListener,
    runtime: Arc<ProxyRuntime<R>>,
) -> anyhow::Result<()> {
    info!(
        target: "cachux::master",
        listen = ?listener.local_addr().ok(),
        "accept_loop started for listening socket"
    );

    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(
                    target: "cachux::master",
                    error = ?e,
                    "Failed to accept connection"
                );
                continue;
            }
        };

        debug!(
            target: "cachux::master",
            client_addr = %addr,
            "Connection accepted"
        );

        if let Err(e) = stream.set_nodelay(true) {
            debug!(target: "cachux::master", error = ?e, "Failed to set TCP_NODELAY");
        }

        let runtime = runtime.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(Box::new(stream), addr, runtime).await {
                debug!(
                    target: "cachux::worker",
                    client_addr = %addr,
                    error = ?e,
                    "Connection ended with error"
                );
            }
        });
    }
}
