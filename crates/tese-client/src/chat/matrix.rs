use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use tese_shared::chat::{ChatContent, ChatMessage, ChatTarget};
use tese_shared::constants::{MATRIX_MESSAGE_EVENT, MATRIX_TEXT_MSGTYPE};
use tese_shared::{ChatError, EventId};

use super::{homeserver_error, join_url, parse_base, transport_error, ChatProvider, ChatSession};
use crate::backend::BackendClient;
use crate::config::ChatProviderKind;
use crate::error::Result;
use crate::session::Session;

const CLIENT_API: [&str; 4] = ["_matrix", "client", "v3", "rooms"];

/// Talks to a Matrix homeserver directly with a token issued by the
/// commerce backend.
#[derive(Debug, Clone)]
pub struct MatrixProvider {
    http: reqwest::Client,
    homeserver: reqwest::Url,
    backend: BackendClient,
}

#[derive(Deserialize)]
struct SendResponse {
    #[serde(default)]
    event_id: Option<String>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    chunk: Vec<RawEvent>,
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    event_id: String,
    #[serde(default)]
    sender: String,
    #[serde(default)]
    origin_server_ts: i64,
    #[serde(default)]
    content: serde_json::Value,
}

impl RawEvent {
    /// Text messages only; edits, reactions and state events are dropped.
    fn into_text_message(self) -> Option<ChatMessage> {
        if self.kind != MATRIX_MESSAGE_EVENT || self.event_id.is_empty() {
            return None;
        }
        let msgtype = self.content.get("msgtype")?.as_str()?;
        if msgtype != MATRIX_TEXT_MSGTYPE {
            return None;
        }
        let body = self
            .content
            .get("body")
            .and_then(|b| b.as_str())
            .unwrap_or_default()
            .to_string();
        Some(ChatMessage {
            event_id: self.event_id.into(),
            sender: self.sender,
            origin_server_ts: self.origin_server_ts,
            content: ChatContent {
                body,
                msgtype: msgtype.to_string(),
            },
        })
    }
}

impl MatrixProvider {
    pub fn new(http: reqwest::Client, homeserver_url: &str, backend: BackendClient) -> Result<Self> {
        Ok(Self {
            http,
            homeserver: parse_base(homeserver_url)?,
            backend,
        })
    }

    fn room_url(&self, chat: &ChatSession, tail: &[&str]) -> std::result::Result<reqwest::Url, ChatError> {
        let mut segments: Vec<&str> = CLIENT_API.to_vec();
        segments.push(chat.room_id.as_str());
        segments.extend_from_slice(tail);
        join_url(&self.homeserver, &segments)
    }

    fn token<'a>(&self, chat: &'a ChatSession) -> std::result::Result<&'a str, ChatError> {
        chat.access_token
            .as_deref()
            .ok_or_else(|| ChatError::Homeserver("session has no access token".into()))
    }
}

#[async_trait]
impl ChatProvider for MatrixProvider {
    fn kind(&self) -> ChatProviderKind {
        ChatProviderKind::Matrix
    }

    async fn open_session(
        &self,
        session: &Session,
        target: &ChatTarget,
    ) -> std::result::Result<ChatSession, ChatError> {
        let (token, room) = tokio::join!(
            self.backend.get_chat_token(session),
            self.backend.get_chat_room(session, target),
        );
        match (token, room) {
            (Ok(token), Ok(room)) => {
                debug!(room_id = %room.room_id, user_id = %token.user_id, "Matrix session opened");
                Ok(ChatSession {
                    room_id: room.room_id,
                    user_id: token.user_id,
                    peer_id: target.seller_id.clone(),
                    access_token: Some(token.access_token),
                })
            }
            (token, room) => {
                if let Err(e) = token {
                    error!(error = %e, "Chat token unavailable");
                }
                if let Err(e) = room {
                    error!(error = %e, seller_id = %target.seller_id, "Chat room unavailable");
                }
                Err(ChatError::SessionUnavailable)
            }
        }
    }

    async fn join(&self, chat: &ChatSession) -> std::result::Result<(), ChatError> {
        let response = self
            .http
            .post(self.room_url(chat, &["join"])?)
            .bearer_auth(self.token(chat)?)
            .json(&json!({}))
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
            .get(self.room_url(chat, &["messages"])?)
            .bearer_auth(self.token(chat)?)
            .query(&[("limit", limit.as_str()), ("dir", "b")])
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(homeserver_error(response).await);
        }
        let body: MessagesResponse = response.json().await.map_err(transport_error)?;

        // `dir=b` pages newest first.
        let mut messages: Vec<ChatMessage> = body
            .chunk
            .into_iter()
            .filter_map(RawEvent::into_text_message)
            .collect();
        messages.reverse();
        Ok(messages)
    }

    async fn send_message(
        &self,
        chat: &ChatSession,
        body: &str,
    ) -> std::result::Result<Option<EventId>, ChatError> {
        let txn_id = uuid::Uuid::new_v4().to_string();
        let response = self
            .http
            .put(self.room_url(chat, &["send", MATRIX_MESSAGE_EVENT, txn_id.as_str()])?)
            .bearer_auth(self.token(chat)?)
            .json(&json!({ "msgtype": MATRIX_TEXT_MSGTYPE, "body": body }))
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(homeserver_error(response).await);
        }
        let sent: SendResponse = response.json().await.map_err(transport_error)?;
        Ok(Some(EventId::new(sent.event_id.unwrap_or(txn_id))))
    }
}
