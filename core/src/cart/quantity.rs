// bookcart/src/cart/quantity.rs

//! Quantity arithmetic shared by both cart sources.
//!
//! A requested change is turned into a `QuantityPlan` against the line's current
//! quantity and its ceiling. The plan is what gets applied locally or submitted
//! remotely, so both sources clamp and remove the same way.

/// A change requested by the storefront for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
  /// Add this many to the line, creating it if absent.
  Add(u32),
  Increase,
  Decrease,
  /// Set an absolute quantity. Zero removes the line.
  Set(u32),
  Remove,
}

/// What has to happen to a line after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityPlan {
  /// The clamped target equals the current quantity. Nothing is submitted.
  Unchanged,
  /// Store this quantity (always `>= 1`).
  Set(u32),
  /// Drop the line. Never expressed as a zero quantity.
  Remove,
}

/// The highest quantity a line may hold: its known stock, lowered by an optional
/// per-line cap.
pub fn ceiling(stock: u32, max_line_quantity: Option<u32>) -> u32 {
  match max_line_quantity {
    Some(cap) => stock.min(cap),
    None => stock,
  }
}

/// Plans `change` for a line currently holding `current` (0 when the line does
/// not exist), clamping the target to `[0, ceiling]`.
///
/// A line whose stock dropped below its quantity is pulled down to the ceiling
/// by any mutation, including an increase.
pub fn plan(current: u32, change: QuantityChange, ceiling: u32) -> QuantityPlan {
  let target = match change {
    QuantityChange::Add(amount) => current.saturating_add(amount),
    QuantityChange::Increase => current.saturating_add(1),
    QuantityChange::Decrease => current.saturating_sub(1),
    QuantityChange::Set(quantity) => quantity,
    QuantityChange::Remove => 0,
  };
  let clamped = target.min(ceiling);

  if clamped == 0 {
    if current == 0 {
      QuantityPlan::Unchanged
    } else {
      QuantityPlan::Remove
    }
  } else if clamped == current {
    QuantityPlan::Unchanged
  } else {
    QuantityPlan::Set(clamped)
  }
}

impl QuantityPlan {
  /// Quantity held after the plan is applied to a line currently at `current`.
  pub fn resulting_quantity(self, current: u32) -> u32 {
    match self {
      QuantityPlan::Unchanged => current,
      QuantityPlan::Set(quantity) => quantity,
      QuantityPlan::Remove => 0,
    }
  }
}
