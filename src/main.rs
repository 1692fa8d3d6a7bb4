use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::info;

use slotbook::catalog::Catalog;
use slotbook::engine::Engine;
use slotbook::wire;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves on ctrl-c, or on SIGTERM where that exists.
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            r = tokio::signal::ctrl_c() => r,
            _ = sigterm.recv() => Ok(()),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("SLOTBOOK_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    slotbook::observability::init(metrics_port)?;

    let port = std::env::var("SLOTBOOK_PORT").unwrap_or_else(|_| "5480".into());
    let bind = std::env::var("SLOTBOOK_BIND").unwrap_or_else(|_| "0.0.0.0".into());
    let catalog_path = std::env::var("SLOTBOOK_CATALOG").unwrap_or_else(|_| "./catalog.json".into());
    let data_dir = std::env::var("SLOTBOOK_DATA_DIR").ok();
    let currency: Arc<str> = std::env::var("SLOTBOOK_CURRENCY")
        .unwrap_or_else(|_| "Rs.".into())
        .into();
    let max_connections: usize = std::env::var("SLOTBOOK_MAX_CONNECTIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(256);

    let catalog = Arc::new(Catalog::load(&PathBuf::from(&catalog_path))?);
    info!("loaded {} facilities from {catalog_path}", catalog.len());

    let engine = match &data_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            Engine::open(catalog, &PathBuf::from(dir).join("bookings.wal"))?
        }
        None => Engine::in_memory(catalog),
    };
    let engine = Arc::new(engine);
    let semaphore = Arc::new(Semaphore::new(max_connections));

    let addr = format!("{bind}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("slotbook listening on {addr}");
    info!("  data_dir: {}", data_dir.as_deref().unwrap_or("(in-memory)"));
    info!("  max_connections: {max_connections}");
    info!("  metrics: {}", metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (socket, peer) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::error!("accept error: {e}");
                        continue;
                    }
                };

                let permit = match semaphore.clone().try_acquire_owned() {
                    Ok(permit) => permit,
                    Err(_) => {
                        tracing::warn!("connection limit reached, rejecting {peer}");
                        metrics::counter!(slotbook::observability::CONNECTIONS_REJECTED_TOTAL).increment(1);
                        drop(socket);
                        continue;
                    }
                };

                info!("connection from {peer}");
                metrics::counter!(slotbook::observability::CONNECTIONS_TOTAL).increment(1);
                metrics::gauge!(slotbook::observability::CONNECTIONS_ACTIVE).increment(1.0);
                let engine = engine.clone();
                let currency = currency.clone();

                tokio::spawn(async move {
                    let _permit = permit;
                    if let Err(e) = wire::process_connection(socket, engine, currency).await {
                        tracing::error!("connection error from {peer}: {e}");
                    }
                    metrics::gauge!(slotbook::observability::CONNECTIONS_ACTIVE).decrement(1.0);
                });
            }
            signal = &mut shutdown => {
                if let Err(e) = signal {
                    tracing::error!("signal handler failed: {e}");
                }
                info!("shutdown requested, no longer accepting clients");
                break;
            }
        }
    }

    // Every session holds one permit; getting all of them back means every session ended.
    let open = max_connections - semaphore.available_permits();
    info!("waiting up to {DRAIN_TIMEOUT:?} for {open} client sessions");
    match tokio::time::timeout(DRAIN_TIMEOUT, semaphore.acquire_many(max_connections as u32)).await {
        Ok(_) => info!("all client sessions closed"),
        Err(_) => {
            let remaining = max_connections - semaphore.available_permits();
            tracing::warn!("closing with {remaining} client sessions still open");
        }
    }

    info!("slotbook stopped");
    Ok(())
}
