//! Per-node state owned by the dispatcher.
//!
//! Holds the node identity assigned by `init` and the counter used to stamp
//! outbound messages. Handlers receive it by mutable reference for the
//! duration of one call and never keep it.

use crate::error::{AlreadyInitializedError, UnreadyError};
use crate::protocol::{Body, Message, MsgId};

/// Identity assigned to this node by the harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    /// All node ids in the cluster, in the order the harness sent them.
    pub neighbours: Vec<String>,
}

/// Lifecycle phase of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No `init` processed yet.
    Uninitialized,
    /// Identity set; the node can address replies.
    Ready,
}

/// Mutable state of a single node.
#[derive(Debug, Default)]
pub struct NodeState {
    identity: Option<Identity>,
    next_msg_id: MsgId,
}

impl NodeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the current counter value and advance it.
    ///
    /// Values are never reused for the lifetime of the node.
    pub(crate) fn next_id(&mut self) -> MsgId {
        let id = self.next_msg_id;
        self.next_msg_id += 1;
        id
    }

    /// Set the node identity. Only the first call succeeds.
    pub fn set_identity(
        &mut self,
        id: impl Into<String>,
        neighbours: Vec<String>,
    ) -> Result<(), AlreadyInitializedError> {
        if let Some(identity) = &self.identity {
            return Err(AlreadyInitializedError {
                current: identity.id.clone(),
            });
        }
        self.identity = Some(Identity {
            id: id.into(),
            neighbours,
        });
        Ok(())
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn id(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.id.as_str())
    }

    pub fn phase(&self) -> Phase {
        if self.identity.is_some() {
            Phase::Ready
        } else {
            Phase::Uninitialized
        }
    }

    /// Build a reply to `request` sent from this node.
    pub fn reply_to(&self, request: &Message, body: Body) -> Result<Message, UnreadyError> {
        let id = self.id().ok_or(UnreadyError)?;
        Ok(request.reply(id, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_id_monotonic() {
        let mut state = NodeState::new();
        assert_eq!(state.next_id(), 0);
        assert_eq!(state.next_id(), 1);
        assert_eq!(state.next_id(), 2);
    }

    #[test]
    fn test_identity_set_once() {
        let mut state = NodeState::new();
        assert_eq!(state.phase(), Phase::Uninitialized);
        assert!(state.identity().is_none());

        state
            .set_identity("n1", vec!["n1".to_string(), "n2".to_string()])
            .unwrap();
        assert_eq!(state.phase(), Phase::Ready);
        assert_eq!(state.id(), Some("n1"));

        let err = state.set_identity("n9", vec![]).unwrap_err();
        assert_eq!(err.current, "n1");

        let identity = state.identity().unwrap();
        assert_eq!(identity.id, "n1");
        assert_eq!(identity.neighbours, vec!["n1", "n2"]);
    }

    #[test]
    fn test_reply_to_requires_identity() {
        let request = Message::new("c1", "n1", Body::new("echo"));
        let mut state = NodeState::new();
        assert_eq!(
            state.reply_to(&request, Body::new("echo_ok")).unwrap_err(),
            UnreadyError
        );

        state.set_identity("n1", vec![]).unwrap();
        let reply = state.reply_to(&request, Body::new("echo_ok")).unwrap();
        assert_eq!(reply.source, "n1");
        assert_eq!(reply.destination, "c1");
    }

    #[test]
    fn test_reply_source_is_own_id() {
        // Addressed to a different hop; the reply still comes from this node
        let request = Message::new("c1", "relay", Body::new("echo"));
        let mut state = NodeState::new();
        state.set_identity("n1", vec![]).unwrap();
        let reply = state.reply_to(&request, Body::new("echo_ok")).unwrap();
        assert_eq!(reply.source, "n1");
    }
}
