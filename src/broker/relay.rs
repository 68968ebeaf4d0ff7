//! The process-wide relay.
//!
//! A single `Relay` is built at startup and shared with every connection as
//! `Arc<Relay>`. It owns the producer side of the event queue, the optional
//! application binding, and the (not yet started, then running) dispatch
//! loop. Connections talk to it through three hooks: [`Relay::on_open`],
//! [`Relay::on_message`] and [`Relay::on_close`].
//!
//! The dispatch loop cannot be restarted: once it has seen `Shutdown`,
//! events pushed by later connections are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::dispatch::{DispatchLoop, DispatchStats, LoopState};
use super::event::Event;
use super::queue::{self, EventQueue};
use super::registry::RegistrySnapshot;
use crate::application::{Application, QueueMessageFn, SendMessageFn};
use crate::client::ClientHandle;
use crate::transport::decoder;
use crate::transport::message::ServerMessage;
use crate::transport::sender::{self, BroadcastReport};
use crate::utils::RelayError;

pub struct Relay {
    queue: EventQueue,
    application: Option<Arc<dyn Application>>,
    initialized: AtomicBool,
    running: Arc<AtomicBool>,
    pending: Mutex<Option<DispatchLoop>>,
    dispatch: Mutex<Option<JoinHandle<DispatchStats>>>,
    snapshots: watch::Receiver<RegistrySnapshot>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Relay {
    pub fn new(application: Option<Arc<dyn Application>>) -> Self {
        let (queue, receiver) = queue::channel();
        let (snapshot_tx, snapshots) = watch::channel(RegistrySnapshot::default());

        Self {
            queue,
            application,
            initialized: AtomicBool::new(false),
            running: Arc::new(AtomicBool::new(false)),
            pending: Mutex::new(Some(DispatchLoop::new(receiver, snapshot_tx))),
            dispatch: Mutex::new(None),
            snapshots,
        }
    }

    pub fn with_application(application: Arc<dyn Application>) -> Self {
        Self::new(Some(application))
    }

    /// A connection was opened.
    ///
    /// The first call binds the callbacks into the application and spawns the
    /// dispatch loop, so it must run inside a Tokio runtime. Concurrent first
    /// calls are fine: exactly one of them wins the binding.
    pub fn on_open(&self, client: &ClientHandle) {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.bind_application();
            self.start_dispatch();
        } else if self.queue.is_closed() {
            warn!(client_id = %client.id(), "dispatch loop has stopped, client will not receive broadcasts");
        }

        self.queue.push(Event::AddClient(client.downgrade()));

        let sent = sender::encode(&ServerMessage::Initialization)
            .and_then(|frame| sender::send_to_one(client, frame));
        if let Err(e) = sent {
            warn!(client_id = %client.id(), error = %e, "failed to send initialization");
        }
        info!(client_id = %client.id(), "client connected");
    }

    /// A connection was closed. `reason` is only logged.
    pub fn on_close(&self, client: &ClientHandle, reason: &str) {
        self.queue.push(Event::RemoveClient(client.id()));
        info!(client_id = %client.id(), reason, "client disconnected");
    }

    /// A text frame arrived. `None` (no text) is ignored.
    pub fn on_message(&self, client: &ClientHandle, raw: Option<&str>) {
        let Some(raw) = raw else {
            return;
        };

        let command = match decoder::decode(raw) {
            Ok(command) => command,
            Err(e) => {
                warn!(
                    client_id = %client.id(),
                    error = %e,
                    frame = %decoder::excerpt(raw),
                    "ignoring client message"
                );
                return;
            }
        };

        let Some(application) = self.application.as_deref() else {
            warn!(
                client_id = %client.id(),
                ?command,
                error = %RelayError::NoApplication,
                "dropping command"
            );
            return;
        };

        decoder::invoke(application, &command, client.id());
    }

    /// Enqueue an application record, exactly like the callback handed to
    /// the application does.
    pub fn queue_message(&self, record: Value) {
        enqueue_record(&self.queue, record);
    }

    /// Broadcast a record to the current clients right away.
    pub fn send_message(&self, record: &Value) -> BroadcastReport {
        broadcast_record(&self.snapshots, record)
    }

    /// Ask the dispatch loop to stop once every event already queued has
    /// been applied. Open connections are left alone.
    pub fn close(&self) {
        info!("relay closing");
        self.queue.push(Event::Shutdown);
    }

    /// Wait for the dispatch loop to exit. `None` if it was never started,
    /// was already joined, or panicked.
    pub async fn join(&self) -> Option<DispatchStats> {
        let handle = lock(&self.dispatch).take()?;
        match handle.await {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(error = %e, "dispatch loop task failed");
                None
            }
        }
    }

    pub fn state(&self) -> LoopState {
        if self.running.load(Ordering::Acquire) {
            LoopState::Running
        } else {
            LoopState::Stopped
        }
    }

    /// Membership as of the last registry change the loop applied.
    pub fn clients(&self) -> RegistrySnapshot {
        self.snapshots.borrow().clone()
    }

    fn bind_application(&self) {
        let Some(application) = &self.application else {
            warn!(error = %RelayError::NoApplication, "commands will be dropped");
            return;
        };

        let snapshots = self.snapshots.clone();
        let send_message: SendMessageFn = Arc::new(move |record: Value| {
            broadcast_record(&snapshots, &record);
        });

        let queue = self.queue.clone();
        let queue_message: QueueMessageFn = Arc::new(move |record: Value| {
            enqueue_record(&queue, record);
        });

        application.set_callback_send_message(send_message);
        application.set_callback_queue_message(queue_message);
        info!("application callbacks bound");
    }

    fn start_dispatch(&self) {
        let Some(dispatch) = lock(&self.pending).take() else {
            return;
        };

        let running = self.running.clone();
        running.store(true, Ordering::Release);
        let handle = tokio::spawn(async move {
            let stats = dispatch.run().await;
            running.store(false, Ordering::Release);
            stats
        });
        *lock(&self.dispatch) = Some(handle);
        debug!("dispatch loop started");
    }
}

fn enqueue_record(queue: &EventQueue, record: Value) {
    match Event::from_application(record) {
        Ok(Some(event)) => queue.push(event),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "ignoring application record"),
    }
}

fn broadcast_record(snapshots: &watch::Receiver<RegistrySnapshot>, record: &Value) -> BroadcastReport {
    let frame = match sender::encode(record) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "dropping unencodable application message");
            return BroadcastReport::default();
        }
    };
    let clients = snapshots.borrow().clone();
    sender::broadcast(clients.iter(), &frame)
}
