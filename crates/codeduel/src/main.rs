//! `codeduel-server`: runs a duel server until Ctrl-C.
//!
//! The first argument is the port (default 12345). `CODEDUEL_BIND`
//! overrides the whole listen address. Log verbosity follows `RUST_LOG`.

use codeduel::{CodeduelServer, DEFAULT_PORT};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<u16>()
            .map_err(|e| format!("invalid port {arg:?}: {e}"))?,
        None => DEFAULT_PORT,
    };
    let bind_addr = std::env::var("CODEDUEL_BIND").unwrap_or_else(|_| format!("0.0.0.0:{port}"));

    let server = CodeduelServer::builder().bind(&bind_addr).build().await?;
    tracing::info!(addr = %server.local_addr()?, "listening");

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    Ok(())
}
