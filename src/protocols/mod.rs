//! Built-in protocol handlers.
//!
//! Each protocol module documents its wire format and exposes a `handle`
//! function that the registry binds to the body type.
//!
//! - `init`: node identity assignment
//! - `echo`: payload echo
//! - `error`: error replies and Maelstrom error codes

pub mod echo;
pub mod error;
pub mod init;
