//! # tese-shared
//!
//! Domain model for the tese.io marketplace storefront: RFQs and their
//! quotation versions, negotiation threads, buyer/seller chat, the service
//! catalog and product search. Also holds the rules that do not need the
//! network: the RFQ transition table, the negotiation engine and the chat
//! transcript merge.

pub mod chat;
pub mod constants;
pub mod error;
pub mod negotiation;
pub mod quotation;
pub mod rfq;
pub mod search;
pub mod services;
pub mod types;

pub use error::{ChatError, NegotiationError, RfqError};
pub use types::*;
