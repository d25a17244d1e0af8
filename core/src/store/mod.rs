// bookcart/src/store/mod.rs

//! The remote cart collaborator and an in-memory implementation of it.

pub mod memory;
pub mod remote;

pub use memory::{Fault, InMemoryRemoteStore, MergePolicy, RemoteCall, RemoteOp};
pub use remote::{MergeAck, RemoteCartStore};
