use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;

use tese_client::Session;

/// The visitor's backend session, read from the `Authorization` header or
/// the storefront session cookie. Never rejects; anonymous is a session.
#[derive(Debug, Clone)]
pub struct BuyerSession(pub Session);

impl<S> FromRequestParts<S> for BuyerSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty());
        if let Some(token) = bearer {
            return Ok(Self(Session::bearer(token)));
        }

        let session = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(Session::from_cookie_header)
            .find(Session::is_authenticated)
            .unwrap_or_default();
        Ok(Self(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Session {
        let (mut parts, _) = request.into_parts();
        let BuyerSession(session) = BuyerSession::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        session
    }

    #[tokio::test]
    async fn bearer_header_wins() {
        let request = Request::builder()
            .header(AUTHORIZATION, "Bearer header-token")
            .header(COOKIE, "_medusa_jwt=cookie-token")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.token(), Some("header-token"));
    }

    #[tokio::test]
    async fn falls_back_to_cookie() {
        let request = Request::builder()
            .header(COOKIE, "theme=dark")
            .header(COOKIE, "_medusa_jwt=cookie-token")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.token(), Some("cookie-token"));
    }

    #[tokio::test]
    async fn anonymous_without_credentials() {
        let request = Request::builder().body(()).unwrap();
        assert!(!extract(request).await.is_authenticated());
    }
}
