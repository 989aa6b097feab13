//! Buyer/seller chat.
//!
//! The storefront talks to exactly one chat backend, picked from
//! configuration at start-up and handed around as `Arc<dyn ChatProvider>`.
//! Providers only move messages; ordering and deduplication happen in
//! [`tese_shared::chat::Transcript`] inside [`ChatView`].

mod matrix;
mod talkjs;
mod view;

pub use matrix::MatrixProvider;
pub use talkjs::{one_on_one_id, TalkJsProvider};
pub use view::{ChatView, ChatViewState, LOAD_FAILED_MESSAGE, SEND_FAILED_MESSAGE};

use std::sync::Arc;

use async_trait::async_trait;

use tese_shared::chat::{ChatMessage, ChatTarget};
use tese_shared::{ChatError, EventId, RoomId};

use crate::backend::BackendClient;
use crate::config::{ChatProviderKind, ClientConfig};
use crate::error::{ClientError, Result};
use crate::session::Session;

/// An open conversation: which room, as whom.
#[derive(Clone, PartialEq, Eq)]
pub struct ChatSession {
    pub room_id: RoomId,
    pub user_id: String,
    /// The seller on the other side.
    pub peer_id: String,
    /// Homeserver token, when the provider hands one to the caller.
    pub access_token: Option<String>,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("room_id", &self.room_id)
            .field("user_id", &self.user_id)
            .field("peer_id", &self.peer_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn kind(&self) -> ChatProviderKind;

    /// Resolves credentials and the room for `target`. Any partial failure
    /// fails the whole call with [`ChatError::SessionUnavailable`].
    async fn open_session(
        &self,
        session: &Session,
        target: &ChatTarget,
    ) -> std::result::Result<ChatSession, ChatError>;

    /// Makes sure the user is a member of the room.
    async fn join(&self, _chat: &ChatSession) -> std::result::Result<(), ChatError> {
        Ok(())
    }

    /// Up to `limit` of the most recent text messages, oldest first.
    async fn list_messages(
        &self,
        chat: &ChatSession,
        limit: u32,
    ) -> std::result::Result<Vec<ChatMessage>, ChatError>;

    /// Posts a text message. Returns the server event id when the provider
    /// reports one.
    async fn send_message(
        &self,
        chat: &ChatSession,
        body: &str,
    ) -> std::result::Result<Option<EventId>, ChatError>;
}

/// Stand-in used when no chat backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledChat;

#[async_trait]
impl ChatProvider for DisabledChat {
    fn kind(&self) -> ChatProviderKind {
        ChatProviderKind::Disabled
    }

    async fn open_session(
        &self,
        _session: &Session,
        _target: &ChatTarget,
    ) -> std::result::Result<ChatSession, ChatError> {
        Err(ChatError::Disabled)
    }

    async fn list_messages(
        &self,
        _chat: &ChatSession,
        _limit: u32,
    ) -> std::result::Result<Vec<ChatMessage>, ChatError> {
        Err(ChatError::Disabled)
    }

    async fn send_message(
        &self,
        _chat: &ChatSession,
        _body: &str,
    ) -> std::result::Result<Option<EventId>, ChatError> {
        Err(ChatError::Disabled)
    }
}

/// Builds the provider selected by `config`.
pub fn provider_from_config(
    config: &ClientConfig,
    backend: BackendClient,
    http: reqwest::Client,
) -> Result<Arc<dyn ChatProvider>> {
    let provider: Arc<dyn ChatProvider> = match config.chat_provider() {
        ChatProviderKind::Matrix => {
            if config.matrix_homeserver_url.is_empty() {
                return Err(ClientError::Configuration(
                    "MATRIX_CHAT_ENABLED is set but MATRIX_HS_URL is empty".into(),
                ));
            }
            Arc::new(MatrixProvider::new(http, &config.matrix_homeserver_url, backend)?)
        }
        ChatProviderKind::TalkJs => {
            let (Some(app_id), Some(secret)) = (&config.talkjs_app_id, &config.talkjs_secret_key)
            else {
                return Err(ClientError::Configuration(
                    "TALKJS_APP_ID needs TALKJS_SECRET_KEY".into(),
                ));
            };
            Arc::new(TalkJsProvider::new(
                http,
                &config.talkjs_api_url,
                backend,
                app_id,
                secret,
            )?)
        }
        ChatProviderKind::Disabled => Arc::new(DisabledChat),
    };
    tracing::info!(provider = ?provider.kind(), "Chat provider selected");
    Ok(provider)
}

/// Percent-encoded URL under `base` built from `segments`.
pub(crate) fn join_url(base: &reqwest::Url, segments: &[&str]) -> std::result::Result<reqwest::Url, ChatError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ChatError::Homeserver(format!("{base} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(crate) fn parse_base(url: &str) -> Result<reqwest::Url> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| ClientError::Configuration(format!("invalid chat URL {url}: {e}")))?;
    if parsed.cannot_be_a_base() {
        return Err(ClientError::Configuration(format!("chat URL {url} cannot carry a path")));
    }
    Ok(parsed)
}

/// Maps an unsuccessful homeserver answer to an error carrying its
/// `errcode`/`error` when present.
pub(crate) async fn homeserver_error(response: reqwest::Response) -> ChatError {
    let status = response.status();
    let body: serde_json::Value = response.json().await.unwrap_or_default();
    let detail = ["errcode", "error", "message"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(|v| v.as_str()))
        .collect::<Vec<_>>()
        .join(": ");
    if detail.is_empty() {
        ChatError::Homeserver(status.to_string())
    } else {
        ChatError::Homeserver(format!("{status} {detail}"))
    }
}

pub(crate) fn transport_error(e: reqwest::Error) -> ChatError {
    ChatError::Homeserver(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_token() {
        let chat = ChatSession {
            room_id: "!r:tese.io".into(),
            user_id: "@cus_1:tese.io".into(),
            peer_id: "sel_1".into(),
            access_token: Some("syt_secret".into()),
        };
        let printed = format!("{chat:?}");
        assert!(!printed.contains("syt_secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn disabled_config_selects_disabled_provider() {
        let config = ClientConfig::default();
        let backend = BackendClient::new(&config).unwrap();
        let provider = provider_from_config(&config, backend, reqwest::Client::new()).unwrap();
        assert_eq!(provider.kind(), ChatProviderKind::Disabled);
    }

    #[test]
    fn matrix_without_homeserver_is_rejected() {
        let config = ClientConfig {
            matrix_chat_enabled: true,
            ..ClientConfig::default()
        };
        let backend = BackendClient::new(&config).unwrap();
        assert!(matches!(
            provider_from_config(&config, backend, reqwest::Client::new()),
            Err(ClientError::Configuration(_))
        ));
    }
}
