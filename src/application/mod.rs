//! The `application` module is the seam between the relay and the
//! controller it serves.
//!
//! The relay drives an [`Application`] in two directions. On the first
//! connection it hands over two callbacks the application may call from its
//! own execution context. For each inbound command it calls the matching
//! method directly.

pub mod console;

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

pub use console::ConsoleApplication;

/// Broadcast a record to every registered client right away, bypassing the
/// event queue.
pub type SendMessageFn = Arc<dyn Fn(Value) + Send + Sync>;

/// Append a `status` or `pose` record to the event queue. `null` is
/// accepted and ignored.
pub type QueueMessageFn = Arc<dyn Fn(Value) + Send + Sync>;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Failed(String),
}

#[cfg_attr(test, mockall::automock)]
pub trait Application: Send + Sync {
    fn set_callback_send_message(&self, callback: SendMessageFn);

    fn set_callback_queue_message(&self, callback: QueueMessageFn);

    fn calibrate(&self) -> Result<(), ApplicationError>;

    fn start_node(&self, name: &str) -> Result<(), ApplicationError>;

    fn quit_application(&self) -> Result<(), ApplicationError>;
}
