//! The `broker` module is the concurrency core of the relay: the ordered
//! event queue, the client registry, the dispatch loop that applies events,
//! and the [`Relay`] that connections and the application talk to.

pub mod dispatch;
pub mod event;
pub mod queue;
pub mod registry;
pub mod relay;

pub use dispatch::{DispatchLoop, DispatchStats, LoopState};
pub use event::{Event, Payload};
pub use queue::{EventQueue, EventReceiver};
pub use registry::{ClientRegistry, RegistrySnapshot};
pub use relay::Relay;
