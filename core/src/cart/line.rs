// bookcart/src/cart/line.rs

//! Identifiers and the line type shared by the local and remote carts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
  pub fn new(id: impl Into<String>) -> Self {
    ItemId(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ItemId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for ItemId {
  fn from(id: &str) -> Self {
    ItemId::new(id)
  }
}

/// Stable identifier of a signed-in account, as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
  pub fn new(id: impl Into<String>) -> Self {
    AccountId(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for AccountId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for AccountId {
  fn from(id: &str) -> Self {
    AccountId::new(id)
  }
}

/// A catalog item as the storefront shows it, the input to "add to cart".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
  pub id: ItemId,
  pub title: String,
  pub price_cents: u32,
  pub image_url: Option<String>,
  pub stock: u32,
}

/// One distinct purchasable item held in a cart.
///
/// The display fields are carried so a guest cart renders without the catalog;
/// remote lines are rebuilt from the server on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
  pub item_id: ItemId,
  pub quantity: u32,
  pub title: String,
  pub price_cents: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
  pub stock: u32,
}

impl CartLine {
  pub fn from_catalog(item: &CatalogItem, quantity: u32) -> Self {
    CartLine {
      item_id: item.id.clone(),
      quantity,
      title: item.title.clone(),
      price_cents: item.price_cents,
      image_url: item.image_url.clone(),
      stock: item.stock,
    }
  }

  pub fn line_total_cents(&self) -> u64 {
    u64::from(self.price_cents) * u64::from(self.quantity)
  }

  pub fn to_merge_line(&self) -> MergeLine {
    MergeLine {
      item_id: self.item_id.clone(),
      quantity: self.quantity,
    }
  }

  /// Refreshes display fields and stock from the catalog, keeping the quantity.
  pub(crate) fn refresh_from(&mut self, item: &CatalogItem) {
    self.title = item.title.clone();
    self.price_cents = item.price_cents;
    self.image_url = item.image_url.clone();
    self.stock = item.stock;
  }
}

/// The `(item, quantity)` pair submitted in merge and availability batches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeLine {
  pub item_id: ItemId,
  pub quantity: u32,
}

impl MergeLine {
  pub fn new(item_id: impl Into<ItemId>, quantity: u32) -> Self {
    MergeLine {
      item_id: item_id.into(),
      quantity,
    }
  }
}
