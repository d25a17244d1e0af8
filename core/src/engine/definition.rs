// bookcart/src/engine/definition.rs

//! Contains the `CartEngine` struct, its construction and the synchronous
//! queries the storefront makes while rendering.

use crate::cart::handle::LocalCartHandle;
use crate::cart::line::{AccountId, CartLine, ItemId};
use crate::cart::quantity;
use crate::config::EngineConfig;
use crate::engine::control::LineControls;
use crate::engine::events::CartEvent;
use crate::engine::merge::MergeState;
use crate::engine::source::CartSource;
use crate::error::CartResult;
use crate::store::remote::RemoteCartStore;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{event, Level};

/// The Cart Reconciliation Engine.
///
/// Owns the decision of which cart is authoritative (see [`CartSource`]) and the
/// one-time migration of the guest cart into the account cart on sign-in.
///
/// All methods take `&self`; share the engine behind an `Arc`. Internal locks are
/// `parking_lot` locks and are never held across a remote call.
pub struct CartEngine {
  pub(crate) remote: Arc<dyn RemoteCartStore>,
  pub(crate) local: LocalCartHandle,
  pub(crate) session: Mutex<Session>,
  pub(crate) config: EngineConfig,
  pub(crate) events: broadcast::Sender<CartEvent>,
}

// Lock order: `session` before the local cart, never the reverse.
#[derive(Debug, Default)]
pub(crate) struct Session {
  pub(crate) identity: Option<AccountId>,
  pub(crate) merge: MergeState,
  // Lines with a remote request in flight.
  pub(crate) pending: HashSet<ItemId>,
}

impl CartEngine {
  pub fn new(remote: Arc<dyn RemoteCartStore>, config: EngineConfig) -> Self {
    Self::with_local_cart(remote, LocalCartHandle::default(), config)
  }

  /// Builds an engine around an existing guest cart handle.
  pub fn with_local_cart(remote: Arc<dyn RemoteCartStore>, local: LocalCartHandle, config: EngineConfig) -> Self {
    let (events, _) = broadcast::channel(config.event_capacity.max(1));
    Self {
      remote,
      local,
      session: Mutex::new(Session::default()),
      config,
      events,
    }
  }

  /// Builds an engine whose guest cart is restored from `config.snapshot_path`
  /// (or empty when no path is configured).
  pub fn restore(remote: Arc<dyn RemoteCartStore>, config: EngineConfig) -> CartResult<Self> {
    let local = match &config.snapshot_path {
      Some(path) => LocalCartHandle::restore(path)?,
      None => LocalCartHandle::default(),
    };
    Ok(Self::with_local_cart(remote, local, config))
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  /// Handle to the guest cart. Clones share the engine's cart.
  pub fn local_cart(&self) -> LocalCartHandle {
    self.local.clone()
  }

  pub fn identity(&self) -> Option<AccountId> {
    self.session.lock().identity.clone()
  }

  /// The display and mutation target for the current identity.
  pub fn active_source(&self) -> CartSource {
    CartSource::select(self.session.lock().identity.as_ref())
  }

  pub fn merge_state(&self) -> MergeState {
    self.session.lock().merge.clone()
  }

  pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
    self.events.subscribe()
  }

  pub fn is_pending(&self, item_id: &ItemId) -> bool {
    self.session.lock().pending.contains(item_id)
  }

  /// Guest lines still waiting to be merged while an account is signed in
  /// (non-empty after a failed merge). Empty for guests, whose lines are the
  /// active cart.
  pub fn pending_guest_lines(&self) -> Vec<CartLine> {
    let session = self.session.lock();
    if session.identity.is_none() {
      return Vec::new();
    }
    self.local.read().lines().to_vec()
  }

  /// Enabled state of `line`'s quantity buttons. Increase is disabled once the
  /// line holds its stock (or the configured cap); both are disabled while a
  /// remote request for the line is pending.
  pub fn controls(&self, line: &CartLine) -> LineControls {
    let pending = {
      let session = self.session.lock();
      session.identity.is_some() && session.pending.contains(&line.item_id)
    };
    let ceiling = quantity::ceiling(line.stock, self.config.max_line_quantity);
    LineControls {
      can_increase: !pending && line.quantity < ceiling,
      can_decrease: !pending && line.quantity > 0,
      pending,
    }
  }

  pub(crate) fn emit(&self, cart_event: CartEvent) {
    if self.events.send(cart_event).is_err() {
      event!(Level::TRACE, "No cart event subscribers.");
    }
  }

  /// Writes the guest cart snapshot when one is configured. A failed write is
  /// logged and does not fail the mutation that triggered it.
  pub(crate) fn persist_local(&self) {
    if let Some(path) = &self.config.snapshot_path {
      if let Err(e) = self.local.save_to(path) {
        event!(Level::WARN, error = %e, "Failed to persist local cart snapshot.");
      }
    }
  }

  /// Marks `item_id` as in flight. `None` if it already is.
  pub(crate) fn begin_pending(&self, item_id: &ItemId) -> Option<PendingGuard<'_>> {
    if !self.session.lock().pending.insert(item_id.clone()) {
      return None;
    }
    Some(PendingGuard {
      engine: self,
      item_id: item_id.clone(),
    })
  }
}

/// Clears a line's pending mark when the request finishes, is dropped, or
/// panics.
pub(crate) struct PendingGuard<'a> {
  engine: &'a CartEngine,
  item_id: ItemId,
}

impl Drop for PendingGuard<'_> {
  fn drop(&mut self) {
    self.engine.session.lock().pending.remove(&self.item_id);
  }
}

impl std::fmt::Debug for CartEngine {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let session = self.session.lock();
    f.debug_struct("CartEngine")
      .field("identity", &session.identity)
      .field("merge", &session.merge)
      .field("pending", &session.pending.len())
      .field("local_lines", &self.local.read().len())
      .field("config", &self.config)
      .finish()
  }
}
