//! Dispatch loop
//!
//! The single consumer of the event queue. It is the only code that mutates
//! the [`ClientRegistry`], so registry changes and broadcasts interleave
//! exactly as they were enqueued: a client removed before a status event
//! never sees that status, and a client added before it always does.
//!
//! The loop never fails. Encoding and per-client send errors are logged
//! where they happen and the loop moves on to the next event.

use std::ops::ControlFlow;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::event::{Event, MSG_TYPE, Payload};
use super::queue::EventReceiver;
use super::registry::{ClientRegistry, RegistrySnapshot};
use crate::transport::message::ServerMessage;
use crate::transport::sender;

/// Externally visible state of the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

/// Counters returned when the loop exits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub events: u64,
    pub broadcasts: u64,
    pub clients_at_shutdown: usize,
}

#[derive(Debug)]
pub struct DispatchLoop {
    receiver: EventReceiver,
    registry: ClientRegistry,
    snapshots: watch::Sender<RegistrySnapshot>,
}

impl DispatchLoop {
    pub fn new(receiver: EventReceiver, snapshots: watch::Sender<RegistrySnapshot>) -> Self {
        Self {
            receiver,
            registry: ClientRegistry::new(),
            snapshots,
        }
    }

    /// Drain the queue until a `Shutdown` event, or until every producer is
    /// gone. Events still queued behind `Shutdown` are dropped unprocessed.
    pub async fn run(mut self) -> DispatchStats {
        let mut stats = DispatchStats::default();

        while let Some(event) = self.receiver.pop().await {
            stats.events += 1;
            if self.apply(event, &mut stats).is_break() {
                info!(
                    events = stats.events,
                    broadcasts = stats.broadcasts,
                    "dispatch loop shut down"
                );
                return stats;
            }
        }

        info!("all event producers dropped, dispatch loop exiting");
        stats.clients_at_shutdown = self.shutdown();
        stats
    }

    fn apply(&mut self, event: Event, stats: &mut DispatchStats) -> ControlFlow<()> {
        match event {
            Event::AddClient(client) => {
                let id = client.id();
                if self.registry.insert(client) {
                    debug!(client_id = %id, clients = self.registry.len(), "client registered");
                    self.publish_snapshot();
                }
            }
            Event::RemoveClient(id) => {
                if self.registry.remove(&id) {
                    debug!(client_id = %id, clients = self.registry.len(), "client removed");
                    self.publish_snapshot();
                }
            }
            Event::Status(mut payload) => {
                payload.remove(MSG_TYPE);
                self.broadcast("status", ServerMessage::Status(&payload), &payload);
                stats.broadcasts += 1;
            }
            Event::Pose(mut payload) => {
                payload.remove(MSG_TYPE);
                self.broadcast("pose", ServerMessage::Pose(&payload), &payload);
                stats.broadcasts += 1;
            }
            Event::Shutdown => {
                stats.clients_at_shutdown = self.shutdown();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn broadcast(&self, kind: &str, message: ServerMessage<'_>, payload: &Payload) {
        let frame = match sender::encode(&message) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(kind, fields = payload.len(), error = %e, "dropping unencodable event");
                return;
            }
        };

        let report = sender::broadcast(self.registry.iter(), &frame);
        debug!(
            kind,
            delivered = report.delivered,
            failed = report.failed.len(),
            "broadcast event"
        );
    }

    /// Empties the registry and returns how many clients were in it.
    fn shutdown(&mut self) -> usize {
        let remaining = self.registry.len();
        self.registry.clear();
        self.publish_snapshot();
        remaining
    }

    fn publish_snapshot(&self) {
        self.snapshots.send_replace(self.registry.snapshot());
    }
}
