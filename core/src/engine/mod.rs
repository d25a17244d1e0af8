// bookcart/src/engine/mod.rs

//! The Cart Reconciliation Engine: source selection, merge-on-login and
//! mutation dispatch.

pub mod control;
pub mod definition;
pub mod dispatch;
pub mod events;
pub mod merge;
pub mod reconcile;
pub mod source;

pub use control::{LineControls, MergeOutcome, MutationOutcome, SkipReason};
pub use definition::CartEngine;
pub use events::CartEvent;
pub use merge::MergeState;
pub use source::{CartSource, CartSummary, CartView};
