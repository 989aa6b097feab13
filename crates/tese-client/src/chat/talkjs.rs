use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use sha1::{Digest, Sha1};
use tracing::{debug, error};

use tese_shared::chat::{ChatContent, ChatMessage, ChatTarget};
use tese_shared::constants::MATRIX_TEXT_MSGTYPE;
use tese_shared::{ChatError, EventId, RoomId};

use super::{homeserver_error, join_url, parse_base, transport_error, ChatProvider, ChatSession};
use crate::backend::BackendClient;
use crate::config::ChatProviderKind;
use crate::error::Result;
use crate::session::Session;

/// Hosted TalkJS conversations through the REST API. The buyer side of
/// every conversation is the customer the backend resolves for the session.
#[derive(Clone)]
pub struct TalkJsProvider {
    http: reqwest::Client,
    api_url: reqwest::Url,
    backend: BackendClient,
    app_id: String,
    secret_key: String,
}

impl std::fmt::Debug for TalkJsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TalkJsProvider")
            .field("api_url", &self.api_url.as_str())
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct MessageList {
    #[serde(default)]
    data: Vec<RawMessage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    id: String,
    #[serde(default)]
    sender_id: Option<String>,
    #[serde(default)]
    text: Option<String>,
    /// Epoch milliseconds.
    created_at: i64,
}

/// Conversation id TalkJS derives for a one-on-one chat: the first 20 hex
/// characters of the SHA-1 of the JSON array of both ids, sorted.
pub fn one_on_one_id(a: &str, b: &str) -> String {
    let mut ids = [a, b];
    ids.sort_unstable();
    let encoded = serde_json::to_string(&ids).unwrap_or_default();
    let digest = hex::encode(Sha1::digest(encoded.as_bytes()));
    digest[..20].to_string()
}

impl TalkJsProvider {
    pub fn new(
        http: reqwest::Client,
        api_url: &str,
        backend: BackendClient,
        app_id: &str,
        secret_key: &str,
    ) -> Result<Self> {
        Ok(Self {
            http,
            api_url: parse_base(api_url)?,
            backend,
            app_id: app_id.to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    fn conversation_url(
        &self,
        conversation: &RoomId,
        tail: &[&str],
    ) -> std::result::Result<reqwest::Url, ChatError> {
        let mut segments = vec!["v1", self.app_id.as_str(), "conversations", conversation.as_str()];
        segments.extend_from_slice(tail);
        join_url(&self.api_url, &segments)
    }
}

#[async_trait]
impl ChatProvider for TalkJsProvider {
    fn kind(&self) -> ChatProviderKind {
        ChatProviderKind::TalkJs
    }

    async fn open_session(
        &self,
        session: &Session,
        target: &ChatTarget,
    ) -> std::result::Result<ChatSession, ChatError> {
        if target.seller_id.is_empty() {
            return Err(ChatError::SessionUnavailable);
        }
        let customer = self.backend.try_get_customer(session).await.map_err(|e| {
            error!(error = %e, seller_id = %target.seller_id, "Could not resolve TalkJS customer");
            ChatError::SessionUnavailable
        })?;
        let room_id = RoomId::new(one_on_one_id(&customer.id, &target.seller_id));
        debug!(room_id = %room_id, "TalkJS conversation resolved");
        Ok(ChatSession {
            room_id,
            user_id: customer.id,
            peer_id: target.seller_id.clone(),
            access_token: None,
        })
    }

    /// Upserts the conversation with both participants.
    async fn join(&self, chat: &ChatSession) -> std::result::Result<(), ChatError> {
        let response = self
            .http
            .put(self.conversation_url(&chat.room_id, &[])?)
            .bearer_auth(&self.secret_key)
            .json(&json!({ "participants": [chat.user_id, chat.peer_id] }))
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(homeserver_error(response).await);
        }
        Ok(())
    }

    async fn list_messages(
        &self,
        chat: &ChatSession,
        limit: u32,
    ) -> std::result::Result<Vec<ChatMessage>, ChatError> {
        let limit = limit.to_string();
        let response = self
            .http
            .get(self.conversation_url(&chat.room_id, &["messages"])?)
            .bearer_auth(&self.secret_key)
            .query(&[("limit", limit.as_str())])
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(homeserver_error(response).await);
        }
        let list: MessageList = response.json().await.map_err(transport_error)?;

        // Newest first on the wire; system messages carry no sender.
        let mut messages: Vec<ChatMessage> = list
            .data
            .into_iter()
            .filter_map(|raw| {
                Some(ChatMessage {
                    event_id: EventId::new(raw.id),
                    sender: raw.sender_id?,
                    origin_server_ts: raw.created_at,
                    content: ChatContent {
                        body: raw.text?,
                        msgtype: MATRIX_TEXT_MSGTYPE.to_string(),
                    },
                })
            })
            .collect();
        messages.reverse();
        Ok(messages)
    }

    async fn send_message(
        &self,
        chat: &ChatSession,
        body: &str,
    ) -> std::result::Result<Option<EventId>, ChatError> {
        let response = self
            .http
            .post(self.conversation_url(&chat.room_id, &["messages"])?)
            .bearer_auth(&self.secret_key)
            .json(&json!([{ "text": body, "sender": chat.user_id, "type": "UserMessage" }]))
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(homeserver_error(response).await);
        }
        // TalkJS does not echo the new message id.
        Ok(None)
    }
}
