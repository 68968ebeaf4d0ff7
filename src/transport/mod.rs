//! The `transport` module is responsible for the wire: the JSON frames
//! exchanged with dashboard clients, decoding of inbound commands, encoding
//! and delivery of outbound frames, and the WebSocket server itself.

pub mod decoder;
pub mod message;
pub mod sender;
pub mod websocket;

pub use message::{ClientMessage, ServerMessage};
pub use websocket::{serve, start_websocket_server};

#[cfg(test)]
mod tests;
