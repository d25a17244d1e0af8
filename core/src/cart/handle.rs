// bookcart/src/cart/handle.rs

use crate::cart::local::LocalCart;
use crate::cart::snapshot;
use crate::error::CartResult;
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::path::Path;
use std::sync::Arc;

/// Shared ownership of the guest cart.
///
/// The engine and the embedding storefront hold clones of the same handle, so a
/// restored snapshot or a merge-driven clear is visible to both.
///
/// IMPORTANT: guards are blocking `parking_lot` guards and MUST NOT be held
/// across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct LocalCartHandle(Arc<RwLock<LocalCart>>);

impl LocalCartHandle {
  pub fn new(cart: LocalCart) -> Self {
    LocalCartHandle(Arc::new(RwLock::new(cart)))
  }

  /// Restores the guest cart from a snapshot at `path`. A missing or unreadable
  /// snapshot gives an empty cart.
  pub fn restore(path: &Path) -> CartResult<Self> {
    Ok(Self::new(snapshot::load_or_empty(path)?))
  }

  pub fn read(&self) -> RwLockReadGuard<'_, LocalCart> {
    self.0.read()
  }

  pub(crate) fn write(&self) -> RwLockWriteGuard<'_, LocalCart> {
    self.0.write()
  }

  /// Borrows just the lines, e.g. for rendering.
  pub fn lines(&self) -> MappedRwLockReadGuard<'_, [crate::cart::line::CartLine]> {
    RwLockReadGuard::map(self.read(), |cart| cart.lines())
  }

  /// Runs `f` under the write lock.
  pub fn with_mut<R>(&self, f: impl FnOnce(&mut LocalCart) -> R) -> R {
    f(&mut self.write())
  }

  /// Clone of the current contents.
  pub fn snapshot(&self) -> LocalCart {
    self.read().clone()
  }

  pub fn is_empty(&self) -> bool {
    self.read().is_empty()
  }

  pub fn save_to(&self, path: &Path) -> CartResult<()> {
    let cart = self.snapshot();
    snapshot::save(&cart, path)
  }
}
