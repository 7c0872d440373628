//! Init protocol handler.

use serde::Deserialize;
use tracing::debug;

use super::INIT_OK;
use crate::node::NodeState;
use crate::protocol::{Body, Message};
use crate::registry::HandlerResult;

#[derive(Debug, Deserialize)]
struct InitPayload {
    node_id: String,
    node_ids: Vec<String>,
}

/// Handle an `init` request.
///
/// The payload is validated before the identity is touched, so a malformed
/// request leaves the node uninitialized.
pub fn handle(state: &mut NodeState, message: &Message) -> HandlerResult {
    let init: InitPayload = message.body.payload()?;
    let cluster_size = init.node_ids.len();

    state.set_identity(init.node_id, init.node_ids)?;
    let reply = state.reply_to(message, Body::new(INIT_OK))?;

    debug!(node_id = %reply.source, cluster_size, "Node identity assigned");

    Ok(vec![reply])
}
