//! Init protocol implementation.
//!
//! The harness sends exactly one `init` to each node before any other
//! traffic, telling the node its own id and the ids of every node in the
//! cluster:
//!
//! ```text
//! Request:  {"type":"init","msg_id":1,"node_id":"n1","node_ids":["n1","n2","n3"]}
//! Response: {"type":"init_ok","msg_id":0,"in_reply_to":1}
//! ```
//!
//! The identity is fixed by the first `init`. A repeated `init` is logged and
//! ignored without a reply, so message ids already handed out stay
//! attributable to the same node.

pub mod handler;

pub use handler::handle;

/// Request body type.
pub const INIT: &str = "init";

/// Reply body type.
pub const INIT_OK: &str = "init_ok";
