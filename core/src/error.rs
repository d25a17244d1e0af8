// bookcart/src/error.rs
use crate::cart::line::ItemId;
use anyhow::Error as AnyhowError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CartError {
  /// A remote cart operation was attempted without an account identity.
  /// Callers route to the local cart instead.
  #[error("Remote cart operation requires a signed-in account")]
  NotAuthenticated,

  #[error("Remote cart store unavailable. Source: {source}")]
  Unavailable {
    #[source]
    source: AnyhowError,
  },

  #[error("Remote cart store rejected the request: {reason}")]
  Rejected { item_id: Option<ItemId>, reason: String },

  /// Some lines of a merge batch were not applied. The local cart is kept whole
  /// so the next attempt resubmits the complete batch.
  #[error("Cart merge partially failed ({} line(s) rejected)", .rejected.len())]
  PartialMergeFailure { rejected: Vec<ItemId> },

  #[error("Item not in local cart: {item_id}")]
  UnknownItem { item_id: ItemId },

  #[error("Local cart snapshot I/O failed for '{}'. Source: {source}", .path.display())]
  Snapshot {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Local cart snapshot is not valid JSON: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl CartError {
  /// Whether repeating the same request later may succeed.
  pub fn is_retryable(&self) -> bool {
    matches!(self, CartError::Unavailable { .. } | CartError::PartialMergeFailure { .. })
  }

  pub fn rejected(reason: impl Into<String>) -> Self {
    CartError::Rejected {
      item_id: None,
      reason: reason.into(),
    }
  }

  pub fn rejected_item(item_id: ItemId, reason: impl Into<String>) -> Self {
    CartError::Rejected {
      item_id: Some(item_id),
      reason: reason.into(),
    }
  }
}

// Remote store implementations report transport failures as anyhow errors.
// A CartError that was wrapped on the way up is unwrapped instead of nested.
impl From<AnyhowError> for CartError {
  fn from(err: AnyhowError) -> Self {
    match err.downcast::<CartError>() {
      Ok(cart_err) => cart_err,
      Err(err) => CartError::Unavailable { source: err },
    }
  }
}

pub type CartResult<T, E = CartError> = std::result::Result<T, E>;
