use std::fmt;
use std::hash::{Hash, Hasher};

use tokio::sync::mpsc::{UnboundedSender, WeakUnboundedSender};
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

/// Identity of one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Owning reference to a connected WebSocket client.
///
/// Holds the sending side of the per-connection outbound channel; the writer
/// task on the other side forwards frames to the socket. Once every strong
/// handle is dropped the channel closes and the writer task ends.
///
/// Two handles are equal iff they have the same [`ClientId`].
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: ClientId,
    sender: UnboundedSender<WsMessage>,
}

impl ClientHandle {
    /// Create a handle with a fresh id.
    pub fn new(sender: UnboundedSender<WsMessage>) -> Self {
        Self {
            id: ClientId::new(),
            sender,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn sender(&self) -> &UnboundedSender<WsMessage> {
        &self.sender
    }

    /// Non-owning reference with the same identity.
    pub fn downgrade(&self) -> WeakClientHandle {
        WeakClientHandle {
            id: self.id,
            sender: self.sender.downgrade(),
        }
    }
}

impl PartialEq for ClientHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ClientHandle {}

impl Hash for ClientHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Registry-side view of a client. Never keeps the connection alive.
#[derive(Debug, Clone)]
pub struct WeakClientHandle {
    id: ClientId,
    sender: WeakUnboundedSender<WsMessage>,
}

impl WeakClientHandle {
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// The outbound channel, if the owning connection is still around.
    pub fn upgrade(&self) -> Option<UnboundedSender<WsMessage>> {
        self.sender.upgrade()
    }
}

impl PartialEq for WeakClientHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for WeakClientHandle {}
