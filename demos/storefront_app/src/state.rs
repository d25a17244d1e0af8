// demos/storefront_app/src/state.rs
use crate::config::AppConfig;
use bookcart::{CartEngine, CatalogItem, InMemoryRemoteStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<InMemoryRemoteStore>,
  pub engine: Arc<CartEngine>,
  pub catalog: Arc<Vec<CatalogItem>>,
  pub config: Arc<AppConfig>, // Share loaded config
}
