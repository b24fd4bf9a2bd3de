use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cheque_core::Settings;
use cheque_ocr::ChequePipeline;
use cheque_storage::{ChequeLedger, ChequeStore, CsvStore};
use tracing_subscriber::EnvFilter;

mod routes;

const DEFAULT_BIND: &str = "127.0.0.1:8080";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = match std::env::var_os("CHEQUE_CONFIG") {
        Some(path) => {
            let path = PathBuf::from(path);
            Settings::load(&path).with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => Settings::default(),
    };
    let bind = std::env::var("CHEQUE_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());

    let backend = cheque_ocr::system_backend(settings.ocr.data_path.clone(), &settings.ocr.lang)
        .context("No OCR engine available")?;
    let pipeline = ChequePipeline::new(backend).configure(&settings);

    let store = CsvStore::open(&settings.store_path)
        .with_context(|| format!("Failed to open {}", settings.store_path.display()))?;
    let store: Box<dyn ChequeStore> = Box::new(store);
    let ledger = ChequeLedger::open(store)?;

    let state = Arc::new(routes::AppState::new(pipeline, ledger));
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    tracing::info!("Cheque upload server listening on {bind}, table at {}", settings.store_path.display());

    axum::serve(listener, routes::router(state)).await?;
    Ok(())
}
