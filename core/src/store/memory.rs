// bookcart/src/store/memory.rs

//! An in-process `RemoteCartStore` backed by hash maps, with a call log, injectable
//! faults and optional latency. Used by the demo storefront, benches and tests.

use crate::cart::line::{AccountId, CartLine, CatalogItem, ItemId, MergeLine};
use crate::error::{CartError, CartResult};
use crate::store::remote::{MergeAck, RemoteCartStore};
use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tracing::{event, Level};

/// How `merge_cart` combines a submitted line with what the account already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
  /// Submitted quantities are added to existing lines, clamped to stock. A
  /// resubmitted batch adds again (up to stock).
  #[default]
  Additive,
  /// Each item contributes at most the largest quantity ever submitted for it
  /// since the cart was last cleared, so resubmitting a batch is a no-op.
  Idempotent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
  GetCart,
  MergeCart,
  SetQuantity,
  RemoveLine,
  ClearCart,
  ValidateAvailability,
}

/// One recorded request, with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
  GetCart(AccountId),
  MergeCart(AccountId, Vec<MergeLine>),
  SetQuantity(AccountId, ItemId, u32),
  RemoveLine(AccountId, ItemId),
  ClearCart(AccountId),
  ValidateAvailability(Vec<MergeLine>),
}

impl RemoteCall {
  pub fn op(&self) -> RemoteOp {
    match self {
      RemoteCall::GetCart(_) => RemoteOp::GetCart,
      RemoteCall::MergeCart(..) => RemoteOp::MergeCart,
      RemoteCall::SetQuantity(..) => RemoteOp::SetQuantity,
      RemoteCall::RemoveLine(..) => RemoteOp::RemoveLine,
      RemoteCall::ClearCart(_) => RemoteOp::ClearCart,
      RemoteCall::ValidateAvailability(_) => RemoteOp::ValidateAvailability,
    }
  }
}

/// A failure to return from the next call of some operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
  Unavailable(String),
  Rejected(String),
}

impl Fault {
  fn into_error(self) -> CartError {
    match self {
      Fault::Unavailable(msg) => anyhow!(msg).into(),
      Fault::Rejected(reason) => CartError::rejected(reason),
    }
  }
}

#[derive(Default)]
struct AccountCart {
  lines: Vec<(ItemId, u32)>,
  // Idempotent policy only: largest quantity merged per item.
  merged: HashMap<ItemId, u32>,
}

#[derive(Default)]
pub struct InMemoryRemoteStore {
  policy: MergePolicy,
  catalog: RwLock<HashMap<ItemId, CatalogItem>>,
  carts: RwLock<HashMap<AccountId, AccountCart>>,
  faults: Mutex<HashMap<RemoteOp, VecDeque<Fault>>>,
  calls: Mutex<Vec<RemoteCall>>,
  latency: Mutex<Duration>,
}

impl InMemoryRemoteStore {
  pub fn new(policy: MergePolicy) -> Self {
    Self {
      policy,
      ..Default::default()
    }
  }

  pub fn with_catalog(policy: MergePolicy, items: impl IntoIterator<Item = CatalogItem>) -> Self {
    let store = Self::new(policy);
    for item in items {
      store.upsert_item(item);
    }
    store
  }

  // --- Administration (not part of RemoteCartStore) ---

  pub fn upsert_item(&self, item: CatalogItem) {
    self.catalog.write().insert(item.id.clone(), item);
  }

  pub fn set_stock(&self, item_id: &ItemId, stock: u32) {
    if let Some(item) = self.catalog.write().get_mut(item_id) {
      item.stock = stock;
    }
  }

  /// Puts lines straight into an account cart, bypassing stock checks and the
  /// call log.
  pub fn seed_cart(&self, account: &AccountId, lines: impl IntoIterator<Item = MergeLine>) {
    let mut carts = self.carts.write();
    let cart = carts.entry(account.clone()).or_default();
    for line in lines {
      upsert_quantity(&mut cart.lines, &line.item_id, line.quantity);
    }
  }

  pub fn quantity(&self, account: &AccountId, item_id: &ItemId) -> Option<u32> {
    self
      .carts
      .read()
      .get(account)
      .and_then(|c| c.lines.iter().find(|(id, _)| id == item_id).map(|(_, q)| *q))
  }

  pub fn quantities(&self, account: &AccountId) -> Vec<(ItemId, u32)> {
    self.carts.read().get(account).map(|c| c.lines.clone()).unwrap_or_default()
  }

  /// Queues `fault` for the next call of `op`. Queued faults are consumed in order.
  pub fn fail_next(&self, op: RemoteOp, fault: Fault) {
    self.faults.lock().entry(op).or_default().push_back(fault);
  }

  pub fn set_latency(&self, latency: Duration) {
    *self.latency.lock() = latency;
  }

  pub fn calls(&self) -> Vec<RemoteCall> {
    self.calls.lock().clone()
  }

  pub fn calls_for(&self, op: RemoteOp) -> Vec<RemoteCall> {
    self.calls.lock().iter().filter(|c| c.op() == op).cloned().collect()
  }

  pub fn call_count(&self, op: RemoteOp) -> usize {
    self.calls.lock().iter().filter(|c| c.op() == op).count()
  }

  pub fn clear_calls(&self) {
    self.calls.lock().clear();
  }

  // Records the call, waits out the configured latency, then surfaces a queued
  // fault if one is waiting. No lock is held across the sleep.
  async fn enter(&self, call: RemoteCall) -> CartResult<()> {
    let op = call.op();
    self.calls.lock().push(call);

    let latency = *self.latency.lock();
    if !latency.is_zero() {
      tokio::time::sleep(latency).await;
    }

    let fault = self.faults.lock().get_mut(&op).and_then(VecDeque::pop_front);
    match fault {
      Some(fault) => {
        event!(Level::DEBUG, ?op, ?fault, "Injected remote store fault.");
        Err(fault.into_error())
      }
      None => Ok(()),
    }
  }

  fn stock_of(&self, item_id: &ItemId) -> Option<u32> {
    self.catalog.read().get(item_id).map(|i| i.stock)
  }
}

fn upsert_quantity(lines: &mut Vec<(ItemId, u32)>, item_id: &ItemId, quantity: u32) {
  match lines.iter_mut().find(|(id, _)| id == item_id) {
    Some((_, q)) => *q = quantity,
    None => lines.push((item_id.clone(), quantity)),
  }
}

#[async_trait]
impl RemoteCartStore for InMemoryRemoteStore {
  async fn get_cart(&self, account: &AccountId) -> CartResult<Vec<CartLine>> {
    self.enter(RemoteCall::GetCart(account.clone())).await?;

    let catalog = self.catalog.read();
    let carts = self.carts.read();
    let lines = carts
      .get(account)
      .map(|cart| {
        cart
          .lines
          .iter()
          .filter_map(|(id, q)| catalog.get(id).map(|item| CartLine::from_catalog(item, *q)))
          .collect()
      })
      .unwrap_or_default();
    Ok(lines)
  }

  async fn merge_cart(&self, account: &AccountId, lines: &[MergeLine]) -> CartResult<MergeAck> {
    self
      .enter(RemoteCall::MergeCart(account.clone(), lines.to_vec()))
      .await?;

    let catalog = self.catalog.read();
    let mut carts = self.carts.write();
    let cart = carts.entry(account.clone()).or_default();
    let mut ack = MergeAck::complete();

    for line in lines {
      let stock = match catalog.get(&line.item_id) {
        Some(item) if item.stock > 0 => item.stock,
        _ => {
          ack.rejected.push(line.item_id.clone());
          continue;
        }
      };
      let contribution = match self.policy {
        MergePolicy::Additive => line.quantity,
        MergePolicy::Idempotent => {
          let seen = cart.merged.entry(line.item_id.clone()).or_insert(0);
          let delta = line.quantity.saturating_sub(*seen);
          *seen = (*seen).max(line.quantity);
          delta
        }
      };
      let current = cart
        .lines
        .iter()
        .find(|(id, _)| id == &line.item_id)
        .map_or(0, |(_, q)| *q);
      let next = current.saturating_add(contribution).min(stock);
      if next > 0 {
        upsert_quantity(&mut cart.lines, &line.item_id, next);
      }
    }

    event!(Level::DEBUG, %account, lines = lines.len(), rejected = ack.rejected.len(), "In-memory merge applied.");
    Ok(ack)
  }

  async fn set_quantity(&self, account: &AccountId, item_id: &ItemId, quantity: u32) -> CartResult<()> {
    self
      .enter(RemoteCall::SetQuantity(account.clone(), item_id.clone(), quantity))
      .await?;

    let stock = self
      .stock_of(item_id)
      .ok_or_else(|| CartError::rejected_item(item_id.clone(), "unknown item"))?;
    if quantity > stock {
      return Err(CartError::rejected_item(
        item_id.clone(),
        format!("only {} in stock", stock),
      ));
    }

    let mut carts = self.carts.write();
    let cart = carts.entry(account.clone()).or_default();
    if quantity == 0 {
      cart.lines.retain(|(id, _)| id != item_id);
    } else {
      upsert_quantity(&mut cart.lines, item_id, quantity);
    }
    Ok(())
  }

  async fn remove_line(&self, account: &AccountId, item_id: &ItemId) -> CartResult<()> {
    self
      .enter(RemoteCall::RemoveLine(account.clone(), item_id.clone()))
      .await?;

    if let Some(cart) = self.carts.write().get_mut(account) {
      cart.lines.retain(|(id, _)| id != item_id);
    }
    Ok(())
  }

  async fn clear_cart(&self, account: &AccountId) -> CartResult<()> {
    self.enter(RemoteCall::ClearCart(account.clone())).await?;

    if let Some(cart) = self.carts.write().get_mut(account) {
      cart.lines.clear();
      cart.merged.clear();
    }
    Ok(())
  }

  async fn validate_availability(&self, lines: &[MergeLine]) -> CartResult<Vec<ItemId>> {
    self
      .enter(RemoteCall::ValidateAvailability(lines.to_vec()))
      .await?;

    let catalog = self.catalog.read();
    Ok(
      lines
        .iter()
        .filter(|line| catalog.get(&line.item_id).map_or(true, |item| item.stock < line.quantity))
        .map(|line| line.item_id.clone())
        .collect(),
    )
  }
}
