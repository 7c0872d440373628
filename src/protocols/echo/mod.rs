//! Echo protocol implementation.
//!
//! The smallest useful workload: the node answers every `echo` with an
//! `echo_ok` carrying the same payload.
//!
//! ```text
//! Request:  {"type":"echo","msg_id":2,"echo":"hello"}
//! Response: {"type":"echo_ok","msg_id":1,"in_reply_to":2,"echo":"hello"}
//! ```
//!
//! The `echo` value may be any JSON value. Every other payload field of the
//! request is copied into the reply unchanged as well.

pub mod handler;

pub use handler::handle;

/// Request body type.
pub const ECHO: &str = "echo";

/// Reply body type.
pub const ECHO_OK: &str = "echo_ok";

/// Payload field carrying the value to echo.
pub const ECHO_FIELD: &str = "echo";
