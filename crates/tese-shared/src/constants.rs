/// Application name
pub const APP_NAME: &str = "tese.io Sustainability Marketplace";

/// Default page size for RFQ, quotation and negotiation listings
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Default page size for the service catalog
pub const SERVICES_PAGE_LIMIT: u32 = 12;

/// Default page size for product search
pub const SEARCH_HITS_PER_PAGE: u32 = 12;

/// Facets requested from the search index when the caller names none
pub const DEFAULT_SEARCH_FACETS: [&str; 3] = ["variants.condition", "variants.color", "variants.size"];

/// Maximum facet values returned per facet
pub const MAX_VALUES_PER_FACET: u32 = 100;

/// Currency used when an RFQ is created without one
pub const DEFAULT_CURRENCY: &str = "USD";

/// Proposal ceiling for a new negotiation thread when the backend omits one
pub const DEFAULT_MAX_PROPOSALS: u32 = 5;

/// Chat polling interval in milliseconds
pub const CHAT_POLL_INTERVAL_MS: u64 = 3000;

/// Number of most recent chat messages fetched per poll
pub const CHAT_PAGE_SIZE: u32 = 50;

/// Error surfaced when a chat session cannot be opened
pub const CHAT_UNAVAILABLE_MESSAGE: &str = "Could not start chat. Please try again.";

/// Matrix event type and msgtype for plain text messages
pub const MATRIX_MESSAGE_EVENT: &str = "m.room.message";
pub const MATRIX_TEXT_MSGTYPE: &str = "m.text";
