//! Events carried by the relay queue.
//!
//! The discriminant is the only thing the dispatch loop branches on. Status
//! and pose payloads are opaque JSON objects supplied by the application.
//! The outbound tag comes from the variant alone: a `msgType` key left in a
//! payload is removed before it is encoded.

use serde_json::{Map, Value};

use crate::client::{ClientId, WeakClientHandle};
use crate::utils::RelayError;

/// Field holding the message discriminant on the wire, in both directions.
pub const MSG_TYPE: &str = "msgType";

pub type Payload = Map<String, Value>;

#[derive(Debug, Clone)]
pub enum Event {
    AddClient(WeakClientHandle),
    RemoveClient(ClientId),
    Status(Payload),
    Pose(Payload),
    Shutdown,
}

impl Event {
    pub fn status(mut payload: Payload) -> Self {
        payload.remove(MSG_TYPE);
        Event::Status(payload)
    }

    pub fn pose(mut payload: Payload) -> Self {
        payload.remove(MSG_TYPE);
        Event::Pose(payload)
    }

    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::AddClient(_) => "addClient",
            Event::RemoveClient(_) => "removeClient",
            Event::Status(_) => "status",
            Event::Pose(_) => "pose",
            Event::Shutdown => "shutdown",
        }
    }

    /// Decode a record handed over by the application's queue callback.
    ///
    /// `null` is a valid no-op and yields `Ok(None)`. Only `status` and
    /// `pose` records may be queued this way; registry and shutdown events
    /// are reserved to the relay itself.
    pub fn from_application(record: Value) -> Result<Option<Event>, RelayError> {
        let mut payload = match record {
            Value::Null => return Ok(None),
            Value::Object(map) => map,
            other => {
                return Err(RelayError::MalformedEvent(format!(
                    "expected a JSON object, got {other}"
                )));
            }
        };

        let kind = match payload.remove(MSG_TYPE) {
            Some(Value::String(kind)) => kind,
            Some(other) => {
                return Err(RelayError::MalformedEvent(format!(
                    "{MSG_TYPE} must be a string, got {other}"
                )));
            }
            None => return Err(RelayError::MalformedEvent(format!("missing {MSG_TYPE}"))),
        };

        match kind.as_str() {
            "status" => Ok(Some(Event::Status(payload))),
            "pose" => Ok(Some(Event::Pose(payload))),
            _ => Err(RelayError::UnknownEvent(kind)),
        }
    }
}
