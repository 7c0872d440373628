//! Error protocol implementation.
//!
//! Any request may be answered with an `error` body instead of its usual
//! `*_ok` reply:
//!
//! ```text
//! {"type":"error","in_reply_to":5,"code":10,"text":"unsupported request type 'cas'"}
//! ```
//!
//! ## Codes
//!
//! | Code | Name | Definite |
//! |------|------|----------|
//! | 0 | timeout | no |
//! | 1 | node-not-found | yes |
//! | 10 | not-supported | yes |
//! | 11 | temporarily-unavailable | yes |
//! | 12 | malformed-request | yes |
//! | 13 | crash | no |
//! | 14 | abort | yes |
//! | 20 | key-does-not-exist | yes |
//! | 21 | key-already-exists | yes |
//! | 22 | precondition-failed | yes |
//! | 30 | txn-conflict | yes |
//!
//! A definite error means the requested operation did not take place.

use std::fmt;

use crate::protocol::Body;

pub mod handler;

pub use handler::handle;

/// Body type for error replies.
pub const ERROR: &str = "error";

/// Error code carried by an `error` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Timeout,
    NodeNotFound,
    NotSupported,
    TemporarilyUnavailable,
    MalformedRequest,
    Crash,
    Abort,
    KeyDoesNotExist,
    KeyAlreadyExists,
    PreconditionFailed,
    TxnConflict,
    /// Application-defined code.
    Other(u64),
}

impl ErrorCode {
    pub fn code(self) -> u64 {
        match self {
            ErrorCode::Timeout => 0,
            ErrorCode::NodeNotFound => 1,
            ErrorCode::NotSupported => 10,
            ErrorCode::TemporarilyUnavailable => 11,
            ErrorCode::MalformedRequest => 12,
            ErrorCode::Crash => 13,
            ErrorCode::Abort => 14,
            ErrorCode::KeyDoesNotExist => 20,
            ErrorCode::KeyAlreadyExists => 21,
            ErrorCode::PreconditionFailed => 22,
            ErrorCode::TxnConflict => 30,
            ErrorCode::Other(code) => code,
        }
    }

    pub fn from_code(code: u64) -> Self {
        match code {
            0 => ErrorCode::Timeout,
            1 => ErrorCode::NodeNotFound,
            10 => ErrorCode::NotSupported,
            11 => ErrorCode::TemporarilyUnavailable,
            12 => ErrorCode::MalformedRequest,
            13 => ErrorCode::Crash,
            14 => ErrorCode::Abort,
            20 => ErrorCode::KeyDoesNotExist,
            21 => ErrorCode::KeyAlreadyExists,
            22 => ErrorCode::PreconditionFailed,
            30 => ErrorCode::TxnConflict,
            other => ErrorCode::Other(other),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::Timeout => "timeout",
            ErrorCode::NodeNotFound => "node-not-found",
            ErrorCode::NotSupported => "not-supported",
            ErrorCode::TemporarilyUnavailable => "temporarily-unavailable",
            ErrorCode::MalformedRequest => "malformed-request",
            ErrorCode::Crash => "crash",
            ErrorCode::Abort => "abort",
            ErrorCode::KeyDoesNotExist => "key-does-not-exist",
            ErrorCode::KeyAlreadyExists => "key-already-exists",
            ErrorCode::PreconditionFailed => "precondition-failed",
            ErrorCode::TxnConflict => "txn-conflict",
            ErrorCode::Other(_) => "other",
        }
    }

    /// Whether the failed operation is known not to have happened.
    ///
    /// Unrecognized codes are reported as indefinite.
    pub fn is_definite(self) -> bool {
        !matches!(
            self,
            ErrorCode::Timeout | ErrorCode::Crash | ErrorCode::Other(_)
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

/// Build an `error` body. The caller addresses it as a reply.
pub fn error_body(code: ErrorCode, text: impl Into<String>) -> Body {
    Body::new(ERROR)
        .with("code", code.code())
        .with("text", text.into())
}
