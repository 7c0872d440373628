//! Handler for inbound `error` replies.

use serde::Deserialize;
use tracing::warn;

use super::ErrorCode;
use crate::node::NodeState;
use crate::protocol::Message;
use crate::registry::HandlerResult;

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    code: u64,
    #[serde(default)]
    text: String,
}

/// Acknowledge an `error` reply from a peer. Never answered.
pub fn handle(_state: &mut NodeState, message: &Message) -> HandlerResult {
    let error: ErrorPayload = message.body.payload()?;
    let code = ErrorCode::from_code(error.code);

    warn!(
        src = %message.source,
        in_reply_to = ?message.body.in_reply_to,
        code = error.code,
        code_name = code.name(),
        definite = code.is_definite(),
        text = %error.text,
        "Peer returned error"
    );

    Ok(Vec::new())
}
