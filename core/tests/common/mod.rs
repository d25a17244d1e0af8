// tests/common/mod.rs
#![allow(dead_code)] // Not every test file uses every helper

use bookcart::store::RemoteOp;
use bookcart::{
  AccountId, CartEngine, CartEvent, CartLine, CatalogItem, EngineConfig, InMemoryRemoteStore, ItemId, MergePolicy,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::Level;

// --- Catalog fixtures ---
pub fn book(id: &str, stock: u32) -> CatalogItem {
  CatalogItem {
    id: ItemId::new(id),
    title: format!("Title of {}", id),
    price_cents: 1000,
    image_url: Some(format!("https://covers.example/{}.jpg", id)),
    stock,
  }
}

pub fn dune() -> CatalogItem {
  book("dune", 5)
}

pub fn emma() -> CatalogItem {
  book("emma", 3)
}

pub fn ulysses() -> CatalogItem {
  book("ulysses", 1)
}

pub fn catalog() -> Vec<CatalogItem> {
  vec![dune(), emma(), ulysses()]
}

pub fn u1() -> AccountId {
  AccountId::new("u1")
}

// --- Store and engine builders ---
pub fn new_store(policy: MergePolicy) -> Arc<InMemoryRemoteStore> {
  Arc::new(InMemoryRemoteStore::with_catalog(policy, catalog()))
}

pub fn new_engine(store: &Arc<InMemoryRemoteStore>) -> CartEngine {
  CartEngine::new(store.clone(), EngineConfig::default())
}

pub fn new_engine_with(store: &Arc<InMemoryRemoteStore>, config: EngineConfig) -> CartEngine {
  CartEngine::new(store.clone(), config)
}

/// Adds `(item, amount)` pairs to the engine's guest cart.
pub async fn fill_guest_cart(engine: &CartEngine, items: &[(CatalogItem, u32)]) {
  assert!(engine.identity().is_none(), "guest cart can only be filled while signed out");
  for (item, amount) in items {
    engine.add(item, *amount).await.unwrap();
  }
}

pub fn guest_quantities(engine: &CartEngine) -> Vec<(String, u32)> {
  engine
    .local_cart()
    .snapshot()
    .lines()
    .iter()
    .map(|l| (l.item_id.to_string(), l.quantity))
    .collect()
}

/// The displayed line for `item_id`, read through the engine.
pub async fn displayed_line(engine: &CartEngine, item_id: &str) -> CartLine {
  engine
    .view()
    .await
    .unwrap()
    .line(&ItemId::new(item_id))
    .cloned()
    .unwrap_or_else(|| panic!("line {} not displayed", item_id))
}

pub fn merge_calls(store: &InMemoryRemoteStore) -> usize {
  store.call_count(RemoteOp::MergeCart)
}

pub fn drain_events(rx: &mut broadcast::Receiver<CartEvent>) -> Vec<CartEvent> {
  let mut events = Vec::new();
  while let Ok(event) = rx.try_recv() {
    events.push(event);
  }
  events
}

pub fn temp_snapshot_path() -> PathBuf {
  std::env::temp_dir()
    .join(format!("bookcart-tests-{}", uuid::Uuid::new_v4()))
    .join("guest-cart.json")
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
