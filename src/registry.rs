//! Handler registry: maps a body `type` to the handler that serves it.
//!
//! The registry is populated once at startup and read-only afterwards.
//! Registering the same type twice is a configuration error surfaced before
//! any message is read.

use std::collections::HashMap;
use std::fmt;

use crate::error::{DuplicateHandlerError, HandlerError};
use crate::node::NodeState;
use crate::protocol::Message;
use crate::protocols;

/// Result of a single handler invocation: zero or more outbound messages.
pub type HandlerResult = Result<Vec<Message>, HandlerError>;

/// Serves one body type.
///
/// Handlers return outbound messages with `msg_id` unset; the dispatcher
/// stamps them in emission order. Any closure or function with the matching
/// signature is a handler.
pub trait Handler {
    fn handle(&self, state: &mut NodeState, message: &Message) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&mut NodeState, &Message) -> HandlerResult,
{
    fn handle(&self, state: &mut NodeState, message: &Message) -> HandlerResult {
        self(state, message)
    }
}

/// Registered handlers keyed by body type.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Box<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `init`, `echo` and `error` handlers.
    pub fn with_builtins() -> Result<Self, DuplicateHandlerError> {
        let mut registry = Self::new();
        registry.register(protocols::init::INIT, protocols::init::handle)?;
        registry.register(protocols::echo::ECHO, protocols::echo::handle)?;
        registry.register(protocols::error::ERROR, protocols::error::handle)?;
        Ok(registry)
    }

    /// Register `handler` for body type `kind`.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        handler: impl Handler + 'static,
    ) -> Result<(), DuplicateHandlerError> {
        let kind = kind.into();
        if self.handlers.contains_key(&kind) {
            return Err(DuplicateHandlerError { kind });
        }
        self.handlers.insert(kind, Box::new(handler));
        Ok(())
    }

    /// Find the handler for a body type.
    pub fn lookup(&self, kind: &str) -> Option<&dyn Handler> {
        self.handlers.get(kind).map(|handler| handler.as_ref())
    }

    /// Registered body types, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
