// bookcart/src/engine/source.rs

//! Which cart is authoritative, and what a single read of it looks like.

use crate::cart::line::{AccountId, CartLine, ItemId};
use serde::Serialize;

/// The cart that is the display and mutation target.
///
/// Selected from the identity alone: an account means the remote cart, no
/// identity means the guest cart. Never a mix of both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "account")]
pub enum CartSource {
  Guest,
  Account(AccountId),
}

impl CartSource {
  pub fn select(identity: Option<&AccountId>) -> Self {
    match identity {
      Some(account) => CartSource::Account(account.clone()),
      None => CartSource::Guest,
    }
  }

  pub fn account(&self) -> Option<&AccountId> {
    match self {
      CartSource::Account(account) => Some(account),
      CartSource::Guest => None,
    }
  }

  pub fn is_guest(&self) -> bool {
    matches!(self, CartSource::Guest)
  }
}

/// The lines of one cart, read once from one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
  pub source: CartSource,
  pub lines: Vec<CartLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CartSummary {
  pub line_count: usize,
  pub item_count: u64,
  pub subtotal_cents: u64,
}

impl CartView {
  pub fn line(&self, item_id: &ItemId) -> Option<&CartLine> {
    self.lines.iter().find(|l| &l.item_id == item_id)
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  pub fn summary(&self) -> CartSummary {
    CartSummary {
      line_count: self.lines.len(),
      item_count: self.lines.iter().map(|l| u64::from(l.quantity)).sum(),
      subtotal_cents: self.lines.iter().map(CartLine::line_total_cents).sum(),
    }
  }
}
