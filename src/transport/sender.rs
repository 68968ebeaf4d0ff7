//! Outbound encoding and delivery.
//!
//! Frames are serialized once and cloned per recipient (`Utf8Bytes` clones
//! share the buffer). A failure to reach one client never stops delivery to
//! the others, and never removes anyone from the registry: membership only
//! changes through explicit registry events.

use serde::Serialize;
use tracing::warn;
use tungstenite::protocol::Message as WsMessage;

use crate::client::{ClientHandle, ClientId, WeakClientHandle};
use crate::utils::RelayError;

/// Outcome of a single broadcast.
#[derive(Debug, Default)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: Vec<(ClientId, RelayError)>,
}

impl BroadcastReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed.len()
    }
}

/// Serialize a message into a text frame.
pub fn encode<T: Serialize + ?Sized>(message: &T) -> Result<WsMessage, RelayError> {
    let text = serde_json::to_string(message).map_err(RelayError::Encode)?;
    Ok(WsMessage::text(text))
}

/// Push a frame to one connected client.
pub fn send_to_one(client: &ClientHandle, frame: WsMessage) -> Result<(), RelayError> {
    client
        .sender()
        .send(frame)
        .map_err(|_| RelayError::Send {
            client_id: client.id(),
        })
}

/// Push a frame to a registered client through its weak handle.
pub fn send_to_registered(client: &WeakClientHandle, frame: WsMessage) -> Result<(), RelayError> {
    let sender = client.upgrade().ok_or(RelayError::ClientGone {
        client_id: client.id(),
    })?;
    sender.send(frame).map_err(|_| RelayError::Send {
        client_id: client.id(),
    })
}

/// Attempt delivery of `frame` to every client yielded by `clients`.
pub fn broadcast<'a, I>(clients: I, frame: &WsMessage) -> BroadcastReport
where
    I: IntoIterator<Item = &'a WeakClientHandle>,
{
    let mut report = BroadcastReport::default();
    for client in clients {
        match send_to_registered(client, frame.clone()) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!(client_id = %client.id(), error = %e, "broadcast send failed");
                report.failed.push((client.id(), e));
            }
        }
    }
    report
}
