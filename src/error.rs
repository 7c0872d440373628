//! Error types for the node protocol engine.
//!
//! Only startup misconfiguration ([`DuplicateHandlerError`]) and stream-level
//! failures ([`RuntimeError`]) are fatal. Everything that originates from a
//! single inbound message is contained to that message.

use std::fmt;
use std::io;
use std::str::Utf8Error;

/// A line could not be turned into a [`Message`](crate::protocol::Message).
#[derive(Debug)]
pub enum DecodeError {
    /// The line was empty or whitespace only.
    Empty,
    /// The line was not valid UTF-8.
    InvalidUtf8(Utf8Error),
    /// The line was not a well-formed message envelope.
    Json(serde_json::Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Empty => write!(f, "Empty line"),
            DecodeError::InvalidUtf8(e) => write!(f, "Invalid UTF-8: {}", e),
            DecodeError::Json(e) => write!(f, "Malformed message: {}", e),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Empty => None,
            DecodeError::InvalidUtf8(e) => Some(e),
            DecodeError::Json(e) => Some(e),
        }
    }
}

/// A second handler was registered for an already-claimed body type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateHandlerError {
    pub kind: String,
}

impl fmt::Display for DuplicateHandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler already registered for type '{}'", self.kind)
    }
}

impl std::error::Error for DuplicateHandlerError {}

/// The node identity was already set by an earlier `init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlreadyInitializedError {
    /// Identity that remains in effect.
    pub current: String,
}

impl fmt::Display for AlreadyInitializedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node already initialized as '{}'", self.current)
    }
}

impl std::error::Error for AlreadyInitializedError {}

/// A handler needed the node identity before `init` was processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnreadyError;

impl fmt::Display for UnreadyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node has not been initialized")
    }
}

impl std::error::Error for UnreadyError {}

/// Failure of a single handler invocation.
#[derive(Debug)]
pub enum HandlerError {
    Unready(UnreadyError),
    AlreadyInitialized(AlreadyInitializedError),
    /// The body payload did not match the shape the handler expects.
    MalformedBody {
        kind: String,
        source: serde_json::Error,
    },
    /// A field the handler requires was absent.
    MissingField(&'static str),
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Unready(e) => write!(f, "{}", e),
            HandlerError::AlreadyInitialized(e) => write!(f, "{}", e),
            HandlerError::MalformedBody { kind, source } => {
                write!(f, "Malformed '{}' body: {}", kind, source)
            }
            HandlerError::MissingField(field) => write!(f, "Missing field '{}'", field),
        }
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HandlerError::Unready(e) => Some(e),
            HandlerError::AlreadyInitialized(e) => Some(e),
            HandlerError::MalformedBody { source, .. } => Some(source),
            HandlerError::MissingField(_) => None,
        }
    }
}

impl From<UnreadyError> for HandlerError {
    fn from(e: UnreadyError) -> Self {
        HandlerError::Unready(e)
    }
}

impl From<AlreadyInitializedError> for HandlerError {
    fn from(e: AlreadyInitializedError) -> Self {
        HandlerError::AlreadyInitialized(e)
    }
}

/// Fatal failure of the I/O loop.
#[derive(Debug)]
pub enum RuntimeError {
    /// Reading from the input stream failed.
    Input(io::Error),
    /// Writing to the output stream failed.
    Output(io::Error),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Input(e) => write!(f, "Failed to read input: {}", e),
            RuntimeError::Output(e) => write!(f, "Failed to write output: {}", e),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuntimeError::Input(e) | RuntimeError::Output(e) => Some(e),
        }
    }
}
