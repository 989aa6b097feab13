use serde::{Deserialize, Serialize};

// Backend ids are opaque strings (e.g. "rfq_01HX..."), kept typed so an RFQ id
// can never be passed where a quotation version id is expected.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Trailing characters used as a short human reference.
            pub fn short(&self) -> &str {
                let start = self.0.len().saturating_sub(6);
                self.0.get(start..).unwrap_or(&self.0)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of an RFQ request.
    RfqId
);
string_id!(
    /// Identifier of a single immutable quotation version.
    QuotationVersionId
);
string_id!(
    /// Identifier of a negotiation thread.
    ThreadId
);
string_id!(
    /// Identifier of a negotiation message.
    MessageId
);
string_id!(
    /// Globally unique chat event id assigned by the messaging homeserver.
    EventId
);
string_id!(
    /// Chat room (or conversation) identifier.
    RoomId
);

/// A page of results as returned by the backend list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: u64,
    pub offset: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    /// The fallback returned when a list call fails.
    pub fn empty(limit: u32) -> Self {
        Self {
            items: Vec::new(),
            count: 0,
            offset: 0,
            limit,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.count > u64::from(self.offset) + self.items.len() as u64
    }
}

/// Limit/offset pagination plus an optional status filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl ListParams {
    pub fn new(limit: u32) -> Self {
        Self {
            status: None,
            limit,
            offset: 0,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }
}

impl Default for ListParams {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_PAGE_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_takes_trailing_chars() {
        assert_eq!(ThreadId::from("neg_01HXABCDEF").short(), "ABCDEF");
        assert_eq!(ThreadId::from("abc").short(), "abc");
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = RfqId::from("rfq_1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"rfq_1\"");
    }

    #[test]
    fn page_has_more() {
        let page = Page {
            items: vec![1, 2],
            count: 5,
            offset: 0,
            limit: 2,
        };
        assert!(page.has_more());
        assert!(!Page::<u8>::empty(20).has_more());
    }
}
