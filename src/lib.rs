//! # holorelay
//!
//! `holorelay` is an in-memory pub/sub relay between one controlling
//! application and any number of live dashboard clients connected over
//! WebSockets. The application pushes status and pose updates, which are
//! broadcast to every connected client; clients send back a small set of
//! commands (calibrate, start a node, quit) that are forwarded straight to
//! the application.
//!
//! ## Core Modules
//!
//! - `broker`: the ordered event queue, the client registry and the single
//!   dispatch loop that applies events, plus the `Relay` tying them together.
//! - `client`: handles referring to one connected client.
//! - `application`: the trait the controlling application implements, and a
//!   console implementation used by the binary.
//! - `transport`: wire messages, command decoding, outbound delivery and the
//!   WebSocket server.
//! - `config`: layered configuration (defaults, file, environment).
//! - `utils`: error types and logging setup.

pub mod application;
pub mod broker;
pub mod client;
pub mod config;
pub mod transport;
pub mod utils;

pub use application::{Application, ApplicationError};
pub use broker::Relay;
pub use client::{ClientHandle, ClientId};
pub use utils::RelayError;
