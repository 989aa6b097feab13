use thiserror::Error;

use crate::negotiation::NegotiationThreadStatus;
use crate::rfq::{QuoteStatus, RfqStatus};
use crate::types::{QuotationVersionId, RfqId, ThreadId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RfqError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("Minimum budget ({min}) exceeds maximum budget ({max})")]
    BudgetRange { min: i64, max: i64 },

    #[error("Quantity must be greater than zero")]
    InvalidQuantity,

    #[error("Proposed amount must be positive (got {0})")]
    InvalidAmount(i64),

    #[error("Quotation {quotation} does not belong to RFQ {rfq}")]
    ForeignQuotation {
        rfq: RfqId,
        quotation: QuotationVersionId,
    },

    #[error("Quotation {0} has expired")]
    QuotationExpired(QuotationVersionId),

    #[error("Quotation {id} cannot be accepted while {status}")]
    QuotationNotAcceptable {
        id: QuotationVersionId,
        status: QuoteStatus,
    },

    #[error("Quotation {id} must be accepted before conversion (currently {status})")]
    QuotationNotAccepted {
        id: QuotationVersionId,
        status: QuoteStatus,
    },

    #[error("RFQ {0} has expired")]
    Lapsed(RfqId),

    #[error("RFQ {id} is {status} and can no longer change")]
    ReadOnly { id: RfqId, status: RfqStatus },

    #[error("RFQ cannot move from {from} to {to}")]
    InvalidTransition { from: RfqStatus, to: RfqStatus },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("Negotiation {id} has been closed ({status})")]
    ThreadClosed {
        id: ThreadId,
        status: NegotiationThreadStatus,
    },

    #[error("Message content cannot be empty")]
    EmptyContent,

    #[error("Proposal limit reached ({max} of {max} proposals used)")]
    ProposalLimitReached { max: u32 },

    #[error("Message belongs to thread {found}, not {expected}")]
    WrongThread { expected: ThreadId, found: ThreadId },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("{}", crate::constants::CHAT_UNAVAILABLE_MESSAGE)]
    SessionUnavailable,

    #[error("Chat is not enabled")]
    Disabled,

    #[error("Chat homeserver error: {0}")]
    Homeserver(String),

    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("A message is already being sent")]
    SendInProgress,
}
