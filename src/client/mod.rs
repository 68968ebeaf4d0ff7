//! The `client` module defines how the relay refers to one connected peer.
//!
//! A connection owns its [`ClientHandle`]; everything else (the queue, the
//! registry) only ever holds the [`WeakClientHandle`] obtained from it.

pub mod handle;
pub use handle::{ClientHandle, ClientId, WeakClientHandle};

#[cfg(test)]
mod tests;
