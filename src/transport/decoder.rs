//! Inbound command decoding.
//!
//! Commands go straight to the application; they are never queued. Whatever
//! the application does wrong (an error, a panic) is logged against the
//! client that sent the command and swallowed here.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, warn};

use crate::application::{Application, ApplicationError};
use crate::client::ClientId;
use crate::transport::message::ClientMessage;
use crate::utils::RelayError;

/// Longest excerpt of a rejected frame kept in the log line.
const LOG_EXCERPT_CHARS: usize = 100;

pub fn decode(raw: &str) -> Result<ClientMessage, RelayError> {
    serde_json::from_str(raw).map_err(RelayError::Decode)
}

/// First characters of a frame, for logging.
pub fn excerpt(raw: &str) -> String {
    raw.chars().take(LOG_EXCERPT_CHARS).collect()
}

/// Run `command` against the application.
///
/// Returns `true` when the application call completed without error.
pub fn invoke(application: &dyn Application, command: &ClientMessage, client_id: ClientId) -> bool {
    let (operation, outcome) = match command {
        ClientMessage::CalibrateHoloLens => (
            "calibrate",
            panic::catch_unwind(AssertUnwindSafe(|| application.calibrate())),
        ),
        ClientMessage::StartNode { name } => (
            "start_node",
            panic::catch_unwind(AssertUnwindSafe(|| application.start_node(name))),
        ),
        ClientMessage::QuitApplication => (
            "quit_application",
            panic::catch_unwind(AssertUnwindSafe(|| application.quit_application())),
        ),
    };

    match outcome {
        Ok(Ok(())) => {
            debug!(%client_id, operation, "application command completed");
            true
        }
        Ok(Err(e)) => {
            report_failure(operation, client_id, &e);
            false
        }
        Err(cause) => {
            let message = cause
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| cause.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(%client_id, operation, panic = %message, "application panicked");
            false
        }
    }
}

fn report_failure(operation: &str, client_id: ClientId, e: &ApplicationError) {
    warn!(%client_id, operation, error = %e, "application command failed");
}
