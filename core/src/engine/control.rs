// bookcart/src/engine/control.rs

//! Outcomes the engine hands back to the storefront.

use crate::cart::line::ItemId;
use crate::cart::quantity::QuantityPlan;
use uuid::Uuid;

/// Result of evaluating merge-on-login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
  /// The local cart was submitted, acknowledged and cleared.
  Merged { attempt: Uuid, lines: usize },
  /// The remote store acknowledged the batch after the identity changed. The
  /// local cart was left alone.
  Superseded { attempt: Uuid },
  /// Nothing was submitted.
  Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
  /// No identity, the guest cart stays authoritative.
  Guest,
  /// Nothing to migrate.
  EmptyLocalCart,
  InFlight,
  AlreadyMerged,
}

/// Result of a quantity mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
  Updated { item_id: ItemId, quantity: u32 },
  Removed { item_id: ItemId },
  /// Clamping left the quantity where it was. Nothing was submitted.
  Unchanged { item_id: ItemId },
  /// A request for this line is still in flight. Nothing was submitted.
  Pending { item_id: ItemId },
}

impl MutationOutcome {
  pub(crate) fn from_plan(item_id: ItemId, plan: QuantityPlan) -> Self {
    match plan {
      QuantityPlan::Unchanged => MutationOutcome::Unchanged { item_id },
      QuantityPlan::Set(quantity) => MutationOutcome::Updated { item_id, quantity },
      QuantityPlan::Remove => MutationOutcome::Removed { item_id },
    }
  }

  pub fn item_id(&self) -> &ItemId {
    match self {
      MutationOutcome::Updated { item_id, .. }
      | MutationOutcome::Removed { item_id }
      | MutationOutcome::Unchanged { item_id }
      | MutationOutcome::Pending { item_id } => item_id,
    }
  }

  /// Whether the cart changed.
  pub fn applied(&self) -> bool {
    matches!(self, MutationOutcome::Updated { .. } | MutationOutcome::Removed { .. })
  }
}

/// Enabled state of a line's quantity buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineControls {
  pub can_increase: bool,
  pub can_decrease: bool,
  /// A remote request for the line is in flight.
  pub pending: bool,
}
