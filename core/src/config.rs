// bookcart/src/config.rs

use std::path::PathBuf;

/// Knobs for a `CartEngine`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// Upper bound on any single line, applied on top of stock.
  pub max_line_quantity: Option<u32>,
  /// Emit `CartEvent::RefreshRequested` after a successful merge so the display
  /// re-reads the account cart.
  pub refresh_after_merge: bool,
  /// Buffer size of the event broadcast channel. Slow subscribers lag past it.
  pub event_capacity: usize,
  /// When set, the guest cart is written here after every local change.
  pub snapshot_path: Option<PathBuf>,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      max_line_quantity: None,
      refresh_after_merge: true,
      event_capacity: 64,
      snapshot_path: None,
    }
  }
}
