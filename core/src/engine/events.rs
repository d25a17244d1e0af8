// bookcart/src/engine/events.rs

use crate::cart::line::{AccountId, ItemId};
use crate::engine::source::CartSource;
use uuid::Uuid;

/// Notifications for the storefront: everything a user should see, plus the
/// refresh hint after a merge.
///
/// Errors are carried as display strings because `CartError` is not `Clone`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
  SourceChanged(CartSource),
  MergeStarted {
    attempt: Uuid,
    account: AccountId,
    lines: usize,
  },
  MergeSucceeded {
    attempt: Uuid,
    account: AccountId,
    lines: usize,
  },
  MergeFailed {
    attempt: Uuid,
    account: AccountId,
    reason: String,
    retryable: bool,
  },
  /// The account cart changed behind the display; re-read it.
  RefreshRequested(AccountId),
  /// `quantity` is `None` when the line was removed.
  LineChanged {
    source: CartSource,
    item_id: ItemId,
    quantity: Option<u32>,
  },
  MutationFailed {
    source: CartSource,
    item_id: Option<ItemId>,
    reason: String,
  },
  Cleared(CartSource),
}
