use serde::{Deserialize, Serialize};

use crate::broker::event::Payload;

/// Commands a dashboard client may send. One JSON object per text frame,
/// discriminated by `msgType`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "msgType")]
pub enum ClientMessage {
    #[serde(rename = "calibrateHoloLens")]
    CalibrateHoloLens,

    #[serde(rename = "startNode")]
    StartNode {
        #[serde(rename = "startNode")]
        name: String,
    },

    #[serde(rename = "quitApplication")]
    QuitApplication,
}

/// Frames the relay pushes to clients. Payload fields are flattened next to
/// the `msgType` tag.
#[derive(Debug, Serialize)]
#[serde(tag = "msgType", rename_all = "camelCase")]
pub enum ServerMessage<'a> {
    Initialization,
    Status(&'a Payload),
    Pose(&'a Payload),
}
