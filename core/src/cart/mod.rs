// bookcart/src/cart/mod.rs

//! Cart data: identifiers, lines, quantity planning and the guest cart store.

pub mod handle;
pub mod line;
pub mod local;
pub mod quantity;
pub mod snapshot;

pub use handle::LocalCartHandle;
pub use line::{AccountId, CartLine, CatalogItem, ItemId, MergeLine};
pub use local::LocalCart;
pub use quantity::{QuantityChange, QuantityPlan};
