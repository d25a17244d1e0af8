// bookcart/src/lib.rs

//! bookcart: guest-to-account cart reconciliation for a bookstore storefront.
//!
//! A storefront keeps two carts: a local one for guests and a server-held one
//! for signed-in accounts. bookcart decides which one is authoritative and moves
//! the guest cart into the account cart when the guest signs in:
//!  - An explicit active source (`CartSource::Guest` or `CartSource::Account`),
//!    chosen from the identity alone.
//!  - Merge-on-login guarded by a small state machine
//!    (`Idle -> Merging -> Done | Idle`): at most one attempt in flight, re-armed
//!    on failure, the guest cart cleared only after an acknowledgment.
//!  - Quantity mutations clamped to stock, with a decrease from one always
//!    issued as a removal.
//!  - A `RemoteCartStore` trait for the server side, plus an in-memory store.
//!  - Broadcast `CartEvent`s for the notifications a storefront shows.

pub mod cart;
pub mod config;
pub mod engine;
pub mod error;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::cart::{
  AccountId, CartLine, CatalogItem, ItemId, LocalCart, LocalCartHandle, MergeLine, QuantityChange, QuantityPlan,
};
pub use crate::config::EngineConfig;
pub use crate::engine::{
  CartEngine, CartEvent, CartSource, CartSummary, CartView, LineControls, MergeOutcome, MergeState, MutationOutcome,
  SkipReason,
};
pub use crate::error::{CartError, CartResult};
pub use crate::store::{InMemoryRemoteStore, MergeAck, MergePolicy, RemoteCartStore};

/*
    Typical wiring:
    1. Implement `RemoteCartStore` over the storefront's HTTP client (or use
       `InMemoryRemoteStore` for demos and tests).
    2. Build a `CartEngine` with `CartEngine::restore(remote, config)` so a saved
       guest cart comes back.
    3. Render from `engine.view().await`; drive the buttons with
       `engine.controls(&line)`.
    4. When the identity provider reports a session, call
       `engine.sign_in(account).await`; call `engine.reconcile().await` on later
       state changes so a failed merge is retried.
    5. Surface `engine.subscribe()` events as notifications; re-read the cart on
       `CartEvent::RefreshRequested`.
*/
