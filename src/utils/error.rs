//! The `error` module defines the error types raised inside the relay.
//!
//! Every variant is contained at the boundary where it occurs (decoder,
//! sender, lifecycle handler) and logged there. Nothing in here is allowed
//! to reach the dispatch loop.

use thiserror::Error;

use crate::client::ClientId;

#[derive(Debug, Error)]
pub enum RelayError {
    /// An inbound frame could not be parsed into a known command.
    #[error("invalid client message: {0}")]
    Decode(#[source] serde_json::Error),

    /// An outbound message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// An application record carried a `msgType` the relay does not queue.
    #[error("unknown event type: {0}")]
    UnknownEvent(String),

    /// An application record was not a JSON object, or had no `msgType`.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    #[error("send to client {client_id} failed: channel closed")]
    Send { client_id: ClientId },

    /// The connection behind a registered weak handle has already gone away.
    #[error("client {client_id} is no longer connected")]
    ClientGone { client_id: ClientId },

    #[error("no application bound")]
    NoApplication,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
