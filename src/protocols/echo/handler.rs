//! Echo protocol handler.

use super::{ECHO_FIELD, ECHO_OK};
use crate::error::HandlerError;
use crate::node::NodeState;
use crate::protocol::{Body, Message};
use crate::registry::HandlerResult;

/// Handle an `echo` request.
pub fn handle(state: &mut NodeState, message: &Message) -> HandlerResult {
    let mut reply = state.reply_to(message, Body::new(ECHO_OK))?;

    if message.body.get(ECHO_FIELD).is_none() {
        return Err(HandlerError::MissingField(ECHO_FIELD));
    }
    reply.body.payload = message.body.payload.clone();

    Ok(vec![reply])
}
