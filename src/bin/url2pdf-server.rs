//! Standalone URL-to-PDF server.
//!
//! Run with:
//! ```bash
//! cargo run --bin url2pdf-server --features server
//! ```
//!
//! Configuration comes from `app.env` and the environment (see
//! `url2pdf_api::config::env`). Then:
//!
//! ```bash
//! curl -X POST http://localhost:8080/pdf \
//!      -H 'Content-Type: application/json' \
//!      -d '{"pageToPdf": ["https://example.com", "https://example.org"]}'
//! ```

use std::sync::Arc;

use tokio::signal;
use url2pdf_api::config::env::{bind_addr_from_env, blob_dir_from_env, from_env};
use url2pdf_api::integrations::axum::router;
use url2pdf_api::{
    BlobStore, FsBlobStore, MemoryBlobStore, PdfConverter, SharedBrowserPool, init_browser_pool,
};

/// Resolve on Ctrl+C or SIGTERM, then close the shared browser.
async fn shutdown_signal(pool: SharedBrowserPool) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("❌ Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("❌ Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::info!("🛑 Shutdown signal received, cleaning up...");
    if let Err(e) = tokio::task::spawn_blocking(move || pool.shutdown()).await {
        log::error!("❌ Pool shutdown task failed: {}", e);
    }
    log::info!("✅ Cleanup complete");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("🚀 Starting url2pdf-server...");

    let config = from_env()?;

    let store: Arc<dyn BlobStore> = match blob_dir_from_env() {
        Some(dir) => Arc::new(FsBlobStore::open(dir)?),
        None => {
            log::info!("💾 PDF_BLOB_DIR not set, keeping PDFs in memory");
            Arc::new(MemoryBlobStore::new())
        }
    };

    let pool = init_browser_pool().await?;
    let converter = PdfConverter::new(Arc::clone(&pool), store, config).into_shared();

    let addr = bind_addr_from_env();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("✅ Listening on http://{}", addr);

    axum::serve(listener, router(converter))
        .with_graceful_shutdown(shutdown_signal(pool))
        .await?;

    Ok(())
}
