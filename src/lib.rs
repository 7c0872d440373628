//! glomers-node: a node protocol engine for Maelstrom-style test harnesses.
//!
//! A node reads one JSON message per line on stdin and writes replies, one
//! per line, on stdout. Diagnostics go to stderr.
//!
//! ## Architecture
//!
//! ```text
//! input line ─► protocol::decode ─► Dispatcher ─► Handler ─► outbound messages
//!                                      │                          │
//!                                  NodeState          msg_id stamped in order
//!                                                                 │
//!                                    output line ◄─ protocol::encode
//! ```
//!
//! - `protocol`: message envelope and line codec
//! - `node`: node identity and message id counter
//! - `registry`: body type to handler mapping
//! - `runtime`: dispatcher and the async line loop
//! - `protocols`: built-in `init`, `echo` and `error` handlers
//!
//! New workloads register extra handlers on a [`HandlerRegistry`] before the
//! dispatcher is built:
//!
//! ```no_run
//! use glomers_node::{Body, HandlerRegistry, HandlerResult, Message, NodeState};
//!
//! fn read(state: &mut NodeState, message: &Message) -> HandlerResult {
//!     Ok(vec![state.reply_to(message, Body::new("read_ok").with("value", 0))?])
//! }
//!
//! let mut registry = HandlerRegistry::with_builtins().unwrap();
//! registry.register("read", read).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod node;
pub mod protocol;
pub mod protocols;
pub mod registry;
pub mod runtime;

// Re-exports for convenience.
pub use error::{
    AlreadyInitializedError, DecodeError, DuplicateHandlerError, HandlerError, RuntimeError,
    UnreadyError,
};
pub use node::{Identity, NodeState, Phase};
pub use protocol::{decode, decode_bytes, encode, Body, Message, MsgId};
pub use registry::{Handler, HandlerRegistry, HandlerResult};
pub use runtime::{DispatchOptions, DispatchStats, Dispatcher};
