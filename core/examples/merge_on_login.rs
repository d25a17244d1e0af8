// bookcart/examples/merge_on_login.rs

use bookcart::{
  AccountId, CartEngine, CartError, CatalogItem, EngineConfig, InMemoryRemoteStore, ItemId, MergeOutcome, MergePolicy,
};
use std::sync::Arc;
use tracing::info;

fn book(id: &str, title: &str, price_cents: u32, stock: u32) -> CatalogItem {
  CatalogItem {
    id: ItemId::new(id),
    title: title.to_string(),
    price_cents,
    image_url: None,
    stock,
  }
}

#[tokio::main]
async fn main() -> Result<(), CartError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Merge On Login Example ---");

  // 1. A remote store standing in for the account cart service.
  let dune = book("dune", "Dune", 1899, 4);
  let emma = book("emma", "Emma", 999, 2);
  let store = Arc::new(InMemoryRemoteStore::with_catalog(
    MergePolicy::Additive,
    [dune.clone(), emma.clone()],
  ));

  // 2. The engine starts as a guest: every mutation lands in the local cart.
  let engine = CartEngine::new(store.clone(), EngineConfig::default());
  engine.add(&dune, 2).await?;
  engine.add(&emma, 5).await?; // Clamped to the two in stock
  info!("Guest cart: {:?}", engine.view().await?.summary());

  // 3. Signing in submits the guest cart once and clears it.
  let account = AccountId::new("reader-42");
  match engine.sign_in(account.clone()).await? {
    MergeOutcome::Merged { attempt, lines } => info!(%attempt, lines, "Guest cart merged."),
    other => info!("Merge not performed: {:?}", other),
  }

  // 4. A re-render evaluating merge-on-login again is a no-op.
  info!("Second evaluation: {:?}", engine.reconcile().await?);

  // 5. The account cart is now authoritative.
  let view = engine.view().await?;
  for line in &view.lines {
    info!("{} x{} ({} cents each)", line.title, line.quantity, line.price_cents);
  }
  info!("Account cart: {:?}", view.summary());
  info!("Local cart empty: {}", engine.local_cart().is_empty());

  Ok(())
}
