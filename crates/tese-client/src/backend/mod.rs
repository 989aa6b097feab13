//! HTTP client for the commerce backend's `/store` API.
//!
//! Each resource lives in its own submodule as an `impl BackendClient`
//! block. Reads come in two flavours: `try_*` returns the raw `Result`,
//! the plain variant logs the failure and falls back (empty page or
//! `None`). Mutations always return `Result`.

mod chat;
mod customers;
mod negotiations;
mod quotations;
mod rfq;
mod search;
mod services;

pub use customers::Customer;
pub use quotations::Order;
pub use rfq::AcceptedQuote;

use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use tese_shared::Page;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::session::Session;

const PUBLISHABLE_KEY_HEADER: &str = "x-publishable-api-key";

const NO_QUERY: &[(&str, &str)] = &[];

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    publishable_key: String,
}

impl BackendClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Self::with_http(http, &config.backend_url, &config.publishable_key)
    }

    /// Builds a client around an existing connection pool.
    pub fn with_http(http: reqwest::Client, base_url: &str, publishable_key: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid backend URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Configuration(format!(
                "backend URL {base_url} cannot carry a path"
            )));
        }
        Ok(Self {
            http,
            base_url,
            publishable_key: publishable_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends percent-encoded path segments to the base URL.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Configuration("backend URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str], session: &Session) -> Result<RequestBuilder> {
        let mut builder = self
            .http
            .request(method, self.url(segments)?)
            .header(PUBLISHABLE_KEY_HEADER, &self.publishable_key);
        if let Some(token) = session.token() {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    async fn get<T, Q>(&self, segments: &[&str], query: &Q, session: &Session) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::GET, segments, session)?.query(query);
        self.execute(builder, segments).await
    }

    async fn send_json<T, B>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
        session: &Session,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.request(method, segments, session)?.json(body);
        self.execute(builder, segments).await
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder, segments: &[&str]) -> Result<T> {
        let path = segments.join("/");
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(path));
        }
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
            return Err(ClientError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(format!("{path}: {e}")))
    }
}

/// Logs a failed list call and substitutes an empty page.
fn page_or_empty<T>(result: Result<Page<T>>, limit: u32, what: &'static str) -> Page<T> {
    match result {
        Ok(page) => page,
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch {what}");
            Page::empty(limit)
        }
    }
}

/// Logs a failed get and substitutes `None`. Not-found is expected and only
/// logged at debug level.
fn found_or_none<T>(result: Result<T>, what: &'static str, id: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(ClientError::NotFound(_)) => {
            tracing::debug!(id, "{what} not found");
            None
        }
        Err(e) => {
            tracing::error!(error = %e, id, "Failed to fetch {what}");
            None
        }
    }
}
