use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::http::connection::Connection;
use crate::serve::StaticFiles;

/// Bind the configured address and serve until an accept fails
pub async fn run(cfg: &Config, files: Arc<StaticFiles>) -> anyhow::Result<()> {
    let addr = cfg.server.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}, serving {}", addr, files.root().display());

    serve(listener, files).await
}

/// Accept connections from an already bound listener, one task each
pub async fn serve(listener: TcpListener, files: Arc<StaticFiles>) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        tracing::debug!("Accepted connection from {}", peer);

        let files = Arc::clone(&files);
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, files);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
