//! Negotiation threads: bounded buyer/seller exchanges about one quote.
//!
//! A thread carries at most `max_proposals` proposal-type messages. Plain
//! text stays allowed until the thread is closed. After each message the
//! party that did not send it is expected to answer next.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_PROPOSALS;
use crate::error::NegotiationError;
use crate::types::{MessageId, QuotationVersionId, RfqId, ThreadId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationThreadStatus {
    Active,
    AwaitingBuyer,
    AwaitingSeller,
    OnHold,
    ClosedAccepted,
    ClosedRejected,
    ClosedExpired,
}

impl NegotiationThreadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NegotiationThreadStatus::Active => "active",
            NegotiationThreadStatus::AwaitingBuyer => "awaiting_buyer",
            NegotiationThreadStatus::AwaitingSeller => "awaiting_seller",
            NegotiationThreadStatus::OnHold => "on_hold",
            NegotiationThreadStatus::ClosedAccepted => "closed_accepted",
            NegotiationThreadStatus::ClosedRejected => "closed_rejected",
            NegotiationThreadStatus::ClosedExpired => "closed_expired",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NegotiationThreadStatus::Active => "Active",
            NegotiationThreadStatus::AwaitingBuyer => "Your Turn to Respond",
            NegotiationThreadStatus::AwaitingSeller => "Awaiting Vendor Response",
            NegotiationThreadStatus::OnHold => "On Hold",
            NegotiationThreadStatus::ClosedAccepted => "Deal Accepted",
            NegotiationThreadStatus::ClosedRejected => "Closed - Rejected",
            NegotiationThreadStatus::ClosedExpired => "Closed - Expired",
        }
    }

    pub fn is_closed(&self) -> bool {
        self.as_str().starts_with("closed_")
    }
}

impl std::fmt::Display for NegotiationThreadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderType {
    Buyer,
    Seller,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Text,
    Proposal,
    CounterProposal,
    System,
    FileShared,
}

impl MessageType {
    /// Proposal-type messages count against the thread's ceiling.
    pub fn is_proposal(&self) -> bool {
        matches!(self, MessageType::Proposal | MessageType::CounterProposal)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Proposal => "proposal",
            MessageType::CounterProposal => "counter_proposal",
            MessageType::System => "system",
            MessageType::FileShared => "file_shared",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationThread {
    pub id: ThreadId,
    pub rfq_request_id: RfqId,
    pub buyer_id: String,
    pub seller_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotation_version_id: Option<QuotationVersionId>,
    pub status: NegotiationThreadStatus,
    #[serde(default)]
    pub proposal_count: u32,
    #[serde(default = "default_max_proposals")]
    pub max_proposals: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub talkjs_conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<NegotiationMessage>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_max_proposals() -> u32 {
    DEFAULT_MAX_PROPOSALS
}

impl NegotiationThread {
    pub fn is_closed(&self) -> bool {
        self.status.is_closed()
    }

    pub fn proposals_remaining(&self) -> u32 {
        self.max_proposals.saturating_sub(self.proposal_count)
    }

    /// Checks whether `draft` may be added to this thread.
    pub fn check_send(&self, draft: &MessageDraft) -> Result<(), NegotiationError> {
        if self.is_closed() {
            return Err(NegotiationError::ThreadClosed {
                id: self.id.clone(),
                status: self.status,
            });
        }
        if draft.content.trim().is_empty() {
            return Err(NegotiationError::EmptyContent);
        }
        if draft.message_type.is_proposal() && self.proposal_count >= self.max_proposals {
            return Err(NegotiationError::ProposalLimitReached {
                max: self.max_proposals,
            });
        }
        Ok(())
    }

    /// Applies proposal accounting and turn-taking for an accepted message.
    /// Callers must have passed `check_send` first.
    fn record(&mut self, message: &NegotiationMessage) {
        if message.message_type.is_proposal() {
            self.proposal_count += 1;
        }
        match message.sender_type {
            SenderType::Buyer => self.status = NegotiationThreadStatus::AwaitingSeller,
            SenderType::Seller => self.status = NegotiationThreadStatus::AwaitingBuyer,
            SenderType::System => {}
        }
        self.updated_at = self.updated_at.max(message.created_at);
    }
}

/// What a participant submits; the backend assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDraft {
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposal_data: Option<serde_json::Map<String, serde_json::Value>>,
}

impl MessageDraft {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            message_type: MessageType::Text,
            proposal_data: None,
        }
    }

    pub fn proposal(
        message_type: MessageType,
        content: impl Into<String>,
        proposal_data: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            content: content.into(),
            message_type,
            proposal_data: Some(proposal_data),
        }
    }

    /// Same draft with surrounding whitespace removed from the content.
    pub fn trimmed(mut self) -> Self {
        let trimmed = self.content.trim();
        if trimmed.len() != self.content.len() {
            self.content = trimmed.to_string();
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationMessage {
    pub id: MessageId,
    pub thread_id: ThreadId,
    pub sender_id: String,
    pub sender_type: SenderType,
    pub message_type: MessageType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposal_data: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl NegotiationMessage {
    pub fn draft(&self) -> MessageDraft {
        MessageDraft {
            content: self.content.clone(),
            message_type: self.message_type,
            proposal_data: self.proposal_data.clone(),
        }
    }
}

/// A thread together with its messages, ordered by `created_at` ascending
/// with ties kept in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct NegotiationLedger {
    thread: NegotiationThread,
    messages: Vec<NegotiationMessage>,
}

impl NegotiationLedger {
    /// Wraps a thread and its existing history. History is taken as-is; the
    /// thread's counters are already authoritative for it.
    pub fn new(thread: NegotiationThread, history: Vec<NegotiationMessage>) -> Self {
        Self {
            thread,
            messages: history,
        }
    }

    pub fn thread(&self) -> &NegotiationThread {
        &self.thread
    }

    pub fn messages(&self) -> &[NegotiationMessage] {
        &self.messages
    }

    pub fn into_parts(self) -> (NegotiationThread, Vec<NegotiationMessage>) {
        (self.thread, self.messages)
    }

    /// Adds a new message. On error neither the thread nor the message
    /// sequence changes.
    pub fn append(
        &mut self,
        message: NegotiationMessage,
    ) -> Result<&NegotiationMessage, NegotiationError> {
        if message.thread_id != self.thread.id {
            return Err(NegotiationError::WrongThread {
                expected: self.thread.id.clone(),
                found: message.thread_id,
            });
        }
        self.thread.check_send(&message.draft())?;
        self.thread.record(&message);
        let index = self.insert_ordered(message);
        Ok(&self.messages[index])
    }

    fn insert_ordered(&mut self, message: NegotiationMessage) -> usize {
        let index = self
            .messages
            .partition_point(|existing| existing.created_at <= message.created_at);
        self.messages.insert(index, message);
        index
    }
}
