/// Name of the cookie holding the customer's backend JWT.
pub const SESSION_COOKIE: &str = "_medusa_jwt";

/// A storefront visitor's backend credentials.
///
/// Anonymous sessions are valid; catalog and search calls work without a
/// token while RFQ, negotiation and chat calls are rejected by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            token: (!token.is_empty()).then_some(token),
        }
    }

    /// Reads the session token out of a raw `Cookie` header value.
    pub fn from_cookie_header(header: &str) -> Self {
        let token = header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty());
        Self { token }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_session_cookie() {
        let session = Session::from_cookie_header("theme=dark; _medusa_jwt=abc.def.ghi; lang=pl");
        assert_eq!(session.token(), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_or_empty_cookie_is_anonymous() {
        assert!(!Session::from_cookie_header("theme=dark").is_authenticated());
        assert!(!Session::from_cookie_header("_medusa_jwt=").is_authenticated());
        assert!(!Session::bearer("").is_authenticated());
    }
}
