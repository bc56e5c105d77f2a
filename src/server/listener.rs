use anyhow::Context;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};

use crate::config::Config;
use crate::protocol::connection::{Connection, ConnectionError};
use crate::storage::DiskStore;

pub async fn run(cfg: &Config, shutdown: CancellationToken) -> anyhow::Result<()> {
    let store = DiskStore::open(&cfg.storage.output_dir)
        .await
        .context("preparing output directory")?;
    let listener = bind(&cfg.server.listen_addr).await?;

    serve(listener, store, shutdown).await
}

pub async fn bind(addr: impl ToSocketAddrs) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(addr).await.context("binding listener")?;
    info!("Listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Accepts connections until `shutdown` is cancelled.
///
/// Connections already accepted keep running after the listener closes.
pub async fn serve(
    listener: TcpListener,
    store: DiskStore,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Shutting down listener");
                return Ok(());
            }
            accepted = listener.accept() => accepted.context("accepting connection")?,
        };
        info!("Accepted connection from {}", peer);

        let store = store.clone();
        tokio::spawn(
            async move {
                let mut conn = Connection::new(socket, store);
                match conn.run().await {
                    Ok(summary) => info!(
                        files = summary.files_written,
                        bytes = summary.bytes_written,
                        "Connection closed"
                    ),
                    Err(ConnectionError::Protocol(e)) => {
                        warn!("Closing connection from {}: {}", peer, e)
                    }
                    Err(e) => error!("Connection error from {}: {}", peer, e),
                }
            }
            .instrument(info_span!("conn", %peer)),
        );
    }
}
