//! Message dispatch for the node runtime.
//!
//! Provides synchronous per-line processing (decode, handler lookup, id
//! stamping, encode) with no I/O, so the event loop only moves bytes.

use bytes::Bytes;
use tracing::{debug, error, info, trace, warn};

use crate::node::{NodeState, Phase};
use crate::protocol::{self, Message};
use crate::protocols::error::{error_body, ErrorCode};
use crate::registry::HandlerRegistry;

/// Longest prefix of an undecodable line included in diagnostics.
const DIAGNOSTIC_PREVIEW: usize = 256;

/// Default cap on one input line, terminator included.
pub const DEFAULT_MAX_LINE_SIZE: usize = 16 * 1024 * 1024; // 16MB

/// Dispatch behaviour switches.
#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    /// Answer requests of unknown type with a not-supported error instead of
    /// skipping them.
    pub reply_not_supported: bool,
    /// Lines longer than this are discarded without being decoded.
    pub max_line_size: usize,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            reply_not_supported: false,
            max_line_size: DEFAULT_MAX_LINE_SIZE,
        }
    }
}

/// Counters for one dispatcher's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub lines: u64,
    pub decode_failures: u64,
    pub unhandled: u64,
    pub handler_failures: u64,
    pub replies: u64,
    pub encode_failures: u64,
    pub oversized_lines: u64,
}

/// Owns a node's state and handlers and processes one message at a time.
#[derive(Debug)]
pub struct Dispatcher {
    state: NodeState,
    registry: HandlerRegistry,
    options: DispatchOptions,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self::with_options(registry, DispatchOptions::default())
    }

    pub fn with_options(registry: HandlerRegistry, options: DispatchOptions) -> Self {
        Self {
            state: NodeState::new(),
            registry,
            options,
            stats: DispatchStats::default(),
        }
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn options(&self) -> DispatchOptions {
        self.options
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Account for an input line that was discarded for exceeding
    /// `max_line_size`. Nothing is emitted for it.
    pub fn oversized_line(&mut self, len: usize) {
        self.stats.lines += 1;
        self.stats.oversized_lines += 1;
        warn!(
            bytes = len,
            limit = self.options.max_line_size,
            "Dropping oversized line"
        );
    }

    /// Process one raw input line.
    ///
    /// Returns the encoded frames to write, in emission order. A line that
    /// cannot be decoded is reported and produces nothing.
    pub fn process_line(&mut self, line: &[u8]) -> Vec<Bytes> {
        self.stats.lines += 1;

        let message = match protocol::decode_bytes(line) {
            Ok(message) => message,
            Err(e) => {
                self.stats.decode_failures += 1;
                let preview = String::from_utf8_lossy(&line[..line.len().min(DIAGNOSTIC_PREVIEW)]);
                warn!(
                    error = %e,
                    line = %preview.trim_end(),
                    "Dropping undecodable line"
                );
                return Vec::new();
            }
        };

        let mut frames = Vec::new();
        for outbound in self.dispatch(&message) {
            match protocol::encode(&outbound) {
                Ok(frame) => frames.push(frame),
                Err(e) => {
                    self.stats.encode_failures += 1;
                    error!(
                        error = %e,
                        dest = %outbound.destination,
                        kind = %outbound.body.kind,
                        "Failed to encode message"
                    );
                }
            }
        }
        frames
    }

    /// Run a decoded message through its handler.
    ///
    /// Returns the outbound messages with `msg_id` assigned. Handler errors
    /// are logged and yield no messages.
    pub fn dispatch(&mut self, message: &Message) -> Vec<Message> {
        let body = &message.body;
        trace!(
            src = %message.source,
            kind = %body.kind,
            msg_id = ?body.msg_id,
            "Dispatching message"
        );

        let phase = self.state.phase();
        let result = match self.registry.lookup(&body.kind) {
            Some(handler) => handler.handle(&mut self.state, message),
            None => return self.unhandled(message),
        };

        let outbound = match result {
            Ok(outbound) => outbound,
            Err(e) => {
                self.stats.handler_failures += 1;
                warn!(
                    error = %e,
                    src = %message.source,
                    kind = %body.kind,
                    msg_id = ?body.msg_id,
                    "Handler failed"
                );
                return Vec::new();
            }
        };

        if phase == Phase::Uninitialized && self.state.phase() == Phase::Ready {
            if let Some(identity) = self.state.identity() {
                info!(
                    node_id = %identity.id,
                    neighbours = ?identity.neighbours,
                    "Node ready"
                );
            }
        }

        self.stamp(outbound)
    }

    fn unhandled(&mut self, message: &Message) -> Vec<Message> {
        self.stats.unhandled += 1;
        let body = &message.body;

        if !self.options.reply_not_supported || body.is_reply() || body.msg_id.is_none() {
            debug!(src = %message.source, kind = %body.kind, "No handler, skipping");
            return Vec::new();
        }

        let text = format!("unsupported request type '{}'", body.kind);
        match self
            .state
            .reply_to(message, error_body(ErrorCode::NotSupported, text))
        {
            Ok(reply) => self.stamp(vec![reply]),
            Err(e) => {
                warn!(error = %e, kind = %body.kind, "Cannot reject unsupported request");
                Vec::new()
            }
        }
    }

    /// Assign message ids in emission order.
    fn stamp(&mut self, mut outbound: Vec<Message>) -> Vec<Message> {
        for message in &mut outbound {
            message.body.msg_id = Some(self.state.next_id());
        }
        self.stats.replies += outbound.len() as u64;
        outbound
    }
}
