//! # tese-client
//!
//! Network side of the storefront: the commerce backend client, the RFQ
//! workflow on top of it, optimistic negotiation views and the pluggable
//! chat providers with their polling chat view.

pub mod backend;
pub mod chat;
pub mod config;
pub mod error;
pub mod negotiation_view;
pub mod overlay;
pub mod session;
pub mod workflow;

pub use backend::{AcceptedQuote, BackendClient, Customer, Order};
pub use chat::{provider_from_config, ChatProvider, ChatSession, ChatView};
pub use config::{ChatProviderKind, ClientConfig};
pub use error::{ClientError, Result};
pub use negotiation_view::NegotiationView;
pub use session::Session;
pub use workflow::RfqWorkflow;
