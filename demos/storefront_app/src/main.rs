// demos/storefront_app/src/main.rs

// Declare modules for the application
mod catalog;
mod config;
mod errors;
mod session;
mod state;

use crate::config::{AppConfig, LogFormat};
use crate::errors::Result as AppResult;
use crate::state::AppState;

use bookcart::{CartEngine, InMemoryRemoteStore, MergePolicy};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  // RUST_LOG overrides the default level.
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  match format {
    LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
  }
}

#[tokio::main]
async fn main() -> AppResult<()> {
  // Load application configuration
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      // Tracing is not up yet.
      eprintln!("Failed to load application configuration: {}", e);
      return Err(e);
    }
  };
  init_tracing(app_config.log_format);
  tracing::info!(config = ?app_config, "Starting storefront session...");

  let catalog = Arc::new(catalog::seed_catalog());
  let store = Arc::new(InMemoryRemoteStore::with_catalog(
    MergePolicy::Idempotent,
    catalog.iter().cloned(),
  ));
  let engine = Arc::new(CartEngine::restore(store.clone(), app_config.engine.clone())?);
  tracing::info!(restored_lines = engine.local_cart().read().len(), "Cart engine ready.");

  let logger = session::spawn_event_logger(engine.subscribe());

  let app_state = AppState {
    store,
    engine,
    catalog,
    config: app_config,
  };

  let result = session::run(&app_state).await;

  // Closing the event channel stops the logger.
  drop(app_state);
  if let Err(e) = logger.await {
    tracing::warn!(error = %e, "Event logger task ended abnormally.");
  }

  match result {
    Ok(report) => {
      tracing::info!(?report, "Storefront session finished.");
      Ok(())
    }
    Err(e) => {
      tracing::error!(error = %e, "Storefront session failed.");
      Err(e)
    }
  }
}
