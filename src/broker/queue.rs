//! The relay's single ordered event queue.
//!
//! Any number of [`EventQueue`] clones may push; exactly one
//! [`EventReceiver`] pops. There is no capacity bound: producers are paced
//! by the application's own update cadence and by connection churn.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use super::event::Event;

/// Producer side. Cheap to clone; pushing never blocks and never fails.
#[derive(Debug, Clone)]
pub struct EventQueue {
    sender: UnboundedSender<Event>,
}

/// Consumer side, owned by the dispatch loop.
#[derive(Debug)]
pub struct EventReceiver {
    receiver: UnboundedReceiver<Event>,
}

/// Create a connected queue pair.
pub fn channel() -> (EventQueue, EventReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (EventQueue { sender }, EventReceiver { receiver })
}

impl EventQueue {
    /// Append an event. If the consumer has already exited the event is
    /// dropped.
    pub fn push(&self, event: Event) {
        if let Err(mpsc::error::SendError(event)) = self.sender.send(event) {
            debug!(kind = event.kind(), "dispatch loop stopped, dropping event");
        }
    }

    /// Whether the consumer side is gone.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl EventReceiver {
    /// Wait for the next event, in push order. `None` once every producer
    /// has been dropped and the queue is drained.
    pub async fn pop(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }
}
