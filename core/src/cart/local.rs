// bookcart/src/cart/local.rs

//! The guest cart: an in-process, insertion-ordered list of lines keyed by item id.

use crate::cart::line::{CartLine, CatalogItem, ItemId, MergeLine};
use crate::cart::quantity::{self, QuantityChange, QuantityPlan};
use crate::error::{CartError, CartResult};
use serde::{Deserialize, Serialize};
use tracing::{event, Level};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalCart {
  lines: Vec<CartLine>,
}

impl LocalCart {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn lines(&self) -> &[CartLine] {
    &self.lines
  }

  pub fn get(&self, item_id: &ItemId) -> Option<&CartLine> {
    self.lines.iter().find(|l| &l.item_id == item_id)
  }

  pub fn len(&self) -> usize {
    self.lines.len()
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  pub fn total_quantity(&self) -> u64 {
    self.lines.iter().map(|l| u64::from(l.quantity)).sum()
  }

  /// Inserts `item` or increments its existing line, clamped to the item's stock
  /// (and `max_line_quantity` when set). Display fields are refreshed from the
  /// catalog either way.
  pub fn add(&mut self, item: &CatalogItem, amount: u32, max_line_quantity: Option<u32>) -> QuantityPlan {
    let ceiling = quantity::ceiling(item.stock, max_line_quantity);
    match self.position(&item.id) {
      Some(idx) => {
        let line = &mut self.lines[idx];
        line.refresh_from(item);
        let planned = quantity::plan(line.quantity, QuantityChange::Add(amount), ceiling);
        self.apply_at(idx, planned);
        planned
      }
      None => {
        let planned = quantity::plan(0, QuantityChange::Add(amount), ceiling);
        if let QuantityPlan::Set(q) = planned {
          self.lines.push(CartLine::from_catalog(item, q));
        }
        planned
      }
    }
  }

  /// Applies `change` to an existing line. The line's own recorded stock is the
  /// ceiling.
  pub fn change(
    &mut self,
    item_id: &ItemId,
    change: QuantityChange,
    max_line_quantity: Option<u32>,
  ) -> CartResult<QuantityPlan> {
    let idx = self.position(item_id).ok_or_else(|| CartError::UnknownItem {
      item_id: item_id.clone(),
    })?;
    let line = &self.lines[idx];
    let planned = quantity::plan(
      line.quantity,
      change,
      quantity::ceiling(line.stock, max_line_quantity),
    );
    self.apply_at(idx, planned);
    Ok(planned)
  }

  pub fn set_quantity(
    &mut self,
    item_id: &ItemId,
    quantity: u32,
    max_line_quantity: Option<u32>,
  ) -> CartResult<QuantityPlan> {
    self.change(item_id, QuantityChange::Set(quantity), max_line_quantity)
  }

  pub fn remove(&mut self, item_id: &ItemId) -> CartResult<CartLine> {
    let idx = self.position(item_id).ok_or_else(|| CartError::UnknownItem {
      item_id: item_id.clone(),
    })?;
    Ok(self.lines.remove(idx))
  }

  /// Empties the cart, returning how many lines were dropped.
  pub fn clear(&mut self) -> usize {
    let dropped = self.lines.len();
    self.lines.clear();
    dropped
  }

  pub fn to_merge_lines(&self) -> Vec<MergeLine> {
    self.lines.iter().map(CartLine::to_merge_line).collect()
  }

  /// Restores the line invariants on a cart that came from outside the process
  /// (a snapshot written by an older build, or edited by hand): duplicate ids are
  /// folded together, quantities are clamped to stock, empty lines are dropped.
  pub fn normalize(&mut self) {
    let mut folded: Vec<CartLine> = Vec::with_capacity(self.lines.len());
    for line in self.lines.drain(..) {
      match folded.iter_mut().find(|l| l.item_id == line.item_id) {
        Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
        None => folded.push(line),
      }
    }
    folded.retain_mut(|line| {
      line.quantity = line.quantity.min(line.stock);
      if line.quantity == 0 {
        event!(Level::DEBUG, item_id = %line.item_id, "Dropping empty line while normalizing local cart.");
      }
      line.quantity > 0
    });
    self.lines = folded;
  }

  fn position(&self, item_id: &ItemId) -> Option<usize> {
    self.lines.iter().position(|l| &l.item_id == item_id)
  }

  fn apply_at(&mut self, idx: usize, planned: QuantityPlan) {
    match planned {
      QuantityPlan::Unchanged => {}
      QuantityPlan::Set(q) => self.lines[idx].quantity = q,
      QuantityPlan::Remove => {
        self.lines.remove(idx);
      }
    }
  }
}

impl FromIterator<CartLine> for LocalCart {
  fn from_iter<I: IntoIterator<Item = CartLine>>(iter: I) -> Self {
    let mut cart = LocalCart {
      lines: iter.into_iter().collect(),
    };
    cart.normalize();
    cart
  }
}
