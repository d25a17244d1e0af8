// bookcart/src/store/remote.rs

//! Defines the `RemoteCartStore` trait, the engine's view of the server-held
//! account cart.

use crate::cart::line::{AccountId, CartLine, ItemId, MergeLine};
use crate::error::CartResult;
use async_trait::async_trait;

/// Acknowledgment of a merge batch.
///
/// `rejected` lists the lines the store refused (unknown item, no stock). A
/// non-empty list is a partial failure: the engine keeps the local cart and
/// retries the full batch later.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeAck {
  pub rejected: Vec<ItemId>,
}

impl MergeAck {
  pub fn complete() -> Self {
    Self::default()
  }

  pub fn is_complete(&self) -> bool {
    self.rejected.is_empty()
  }
}

/// Server-side persistence of account carts, reached by request/response calls.
///
/// Transport and encoding belong to the implementation. Transport failures map
/// to `CartError::Unavailable` (an `anyhow::Error` converts into it), business
/// refusals to `CartError::Rejected`.
///
/// The engine resubmits the complete batch to `merge_cart` after any failure,
/// including a partial one, so an implementation sees some or all of those
/// lines again. An idempotent merge keeps the quantity the customer asked for;
/// an additive one adds the resubmitted lines a second time (up to stock).
#[async_trait]
pub trait RemoteCartStore: Send + Sync + 'static {
  /// Current lines of the account's cart, with display fields and stock.
  async fn get_cart(&self, account: &AccountId) -> CartResult<Vec<CartLine>>;

  async fn merge_cart(&self, account: &AccountId, lines: &[MergeLine]) -> CartResult<MergeAck>;

  /// Quantity 0 is equivalent to `remove_line`.
  async fn set_quantity(&self, account: &AccountId, item_id: &ItemId, quantity: u32) -> CartResult<()>;

  async fn remove_line(&self, account: &AccountId, item_id: &ItemId) -> CartResult<()>;

  async fn clear_cart(&self, account: &AccountId) -> CartResult<()>;

  /// Read-only checkout precondition. Returns the ids whose requested quantity
  /// cannot be fulfilled.
  async fn validate_availability(&self, lines: &[MergeLine]) -> CartResult<Vec<ItemId>>;
}
