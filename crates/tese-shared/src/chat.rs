//! Buyer/seller chat messages and the local transcript they merge into.
//!
//! The transport (polling today) hands over unordered, possibly repeated
//! batches; `Transcript::merge` is the only place ordering is decided.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::{EventId, RoomId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatContent {
    pub body: String,
    pub msgtype: String,
}

/// A message as observed on the remote homeserver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub event_id: EventId,
    pub sender: String,
    /// Epoch milliseconds assigned by the server.
    pub origin_server_ts: i64,
    pub content: ChatContent,
}

/// Credentials issued by the commerce backend's chat-token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatToken {
    pub access_token: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRoom {
    pub room_id: RoomId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRoomSummary {
    pub room_id: RoomId,
    pub name: String,
    pub seller_id: String,
}

/// What a buyer wants to chat about; resolved to a room by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTarget {
    pub seller_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,
}

impl ChatTarget {
    pub fn seller(seller_id: impl Into<String>) -> Self {
        Self {
            seller_id: seller_id.into(),
            ..Default::default()
        }
    }
}

/// Result of one merge, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    pub received: usize,
    pub added: usize,
}

/// Deduplicated, time-ordered view of a chat room.
///
/// Messages are keyed by `event_id`; a re-fetched copy replaces the held
/// one. Nothing is ever removed. Display order is `origin_server_ts`
/// ascending, with `event_id` breaking ties so the order is total.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    by_id: HashMap<EventId, ChatMessage>,
    ordered: Vec<ChatMessage>,
    seen: HashSet<EventId>,
    latest_ts: i64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge<I>(&mut self, batch: I) -> MergeOutcome
    where
        I: IntoIterator<Item = ChatMessage>,
    {
        let mut outcome = MergeOutcome::default();
        for message in batch {
            outcome.received += 1;
            self.seen.insert(message.event_id.clone());
            self.latest_ts = self.latest_ts.max(message.origin_server_ts);
            if self
                .by_id
                .insert(message.event_id.clone(), message)
                .is_none()
            {
                outcome.added += 1;
            }
        }

        if outcome.received > 0 {
            let mut ordered: Vec<ChatMessage> = self.by_id.values().cloned().collect();
            ordered.sort_by(|a, b| {
                a.origin_server_ts
                    .cmp(&b.origin_server_ts)
                    .then_with(|| a.event_id.cmp(&b.event_id))
            });
            self.ordered = ordered;
        }
        outcome
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn has_seen(&self, id: &EventId) -> bool {
        self.seen.contains(id)
    }

    /// Highest server timestamp observed so far. Bookkeeping only; never
    /// used to filter incoming batches.
    pub fn latest_ts(&self) -> i64 {
        self.latest_ts
    }
}
