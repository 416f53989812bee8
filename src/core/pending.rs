//! # Pending Replies
//!
//! Tracks which bot message each outstanding request will resolve.
//!
//! Two policies:
//!
//! - **Correlated** (default): an ordered map `RequestId → MessageId`. A
//!   delivery that names its request resolves exactly that entry; one that
//!   doesn't resolves the oldest outstanding entry, since the backend answers
//!   socket messages in the order it receives them.
//! - **SingleSlot**: one slot, overwritten by every registration. A second
//!   submit while a reply is outstanding orphans the earlier bot message,
//!   which then stays loading forever.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::message::MessageId;
use crate::transport::RequestId;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PendingPolicy {
    SingleSlot,
    #[default]
    Correlated,
}

#[derive(Debug, Clone, Default)]
pub struct PendingReplies {
    policy: PendingPolicy,
    entries: VecDeque<(RequestId, MessageId)>,
}

impl PendingReplies {
    pub fn new(policy: PendingPolicy) -> Self {
        Self {
            policy,
            entries: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records a new outstanding request. Under `SingleSlot`, returns the
    /// message that was displaced and can no longer be resolved.
    pub fn register(&mut self, request_id: RequestId, message_id: MessageId) -> Option<MessageId> {
        let orphaned = match self.policy {
            PendingPolicy::SingleSlot => self.entries.pop_front().map(|(_, m)| m),
            PendingPolicy::Correlated => None,
        };
        self.entries.push_back((request_id, message_id));
        orphaned
    }

    /// Removes and returns the message a delivery belongs to.
    ///
    /// With a request id only an exact match is taken; without one the
    /// oldest entry is taken. `None` means the delivery is unsolicited.
    pub fn take(&mut self, request_id: Option<RequestId>) -> Option<MessageId> {
        match request_id {
            Some(id) => {
                let pos = self.entries.iter().position(|(r, _)| *r == id)?;
                self.entries.remove(pos).map(|(_, m)| m)
            }
            None => self.entries.pop_front().map(|(_, m)| m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlated_matches_by_request_id() {
        let mut pending = PendingReplies::new(PendingPolicy::Correlated);
        let (r1, m1) = (RequestId::new(), MessageId::new());
        let (r2, m2) = (RequestId::new(), MessageId::new());
        assert_eq!(pending.register(r1, m1), None);
        assert_eq!(pending.register(r2, m2), None);

        // Out-of-order delivery still lands on the right message
        assert_eq!(pending.take(Some(r2)), Some(m2));
        assert_eq!(pending.take(Some(r1)), Some(m1));
        assert!(pending.is_empty());
    }

    #[test]
    fn uncorrelated_delivery_takes_oldest() {
        let mut pending = PendingReplies::new(PendingPolicy::Correlated);
        let (m1, m2) = (MessageId::new(), MessageId::new());
        pending.register(RequestId::new(), m1);
        pending.register(RequestId::new(), m2);
        assert_eq!(pending.take(None), Some(m1));
        assert_eq!(pending.take(None), Some(m2));
        assert_eq!(pending.take(None), None);
    }

    #[test]
    fn unknown_request_id_is_dropped() {
        let mut pending = PendingReplies::new(PendingPolicy::Correlated);
        pending.register(RequestId::new(), MessageId::new());
        assert_eq!(pending.take(Some(RequestId::new())), None);
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn single_slot_displaces_previous_entry() {
        let mut pending = PendingReplies::new(PendingPolicy::SingleSlot);
        let (r1, m1) = (RequestId::new(), MessageId::new());
        let (r2, m2) = (RequestId::new(), MessageId::new());
        assert_eq!(pending.register(r1, m1), None);
        assert_eq!(pending.register(r2, m2), Some(m1));
        assert_eq!(pending.len(), 1);

        // The displaced request can no longer be matched
        assert_eq!(pending.take(Some(r1)), None);
        assert_eq!(pending.take(None), Some(m2));
    }

    #[test]
    fn policy_parses_from_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: PendingPolicy,
        }
        let w: Wrapper = toml::from_str("policy = \"single_slot\"").unwrap();
        assert_eq!(w.policy, PendingPolicy::SingleSlot);
        assert_eq!(PendingPolicy::default(), PendingPolicy::Correlated);
    }
}
