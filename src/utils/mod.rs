//! The `utils` module provides shared definitions used across the relay:
//! the error taxonomy and the tracing subscriber setup.

pub mod error;
pub mod logging;

pub use error::RelayError;
