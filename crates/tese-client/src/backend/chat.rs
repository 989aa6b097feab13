use reqwest::Method;
use serde::Deserialize;

use tese_shared::chat::{ChatRoom, ChatRoomSummary, ChatTarget, ChatToken};

use super::{BackendClient, NO_QUERY};
use crate::error::{ClientError, Result};
use crate::session::Session;

// The chat endpoints answer 200 with missing fields when the chat service
// is not provisioned for the customer.
#[derive(Deserialize)]
struct TokenBody {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Deserialize)]
struct RoomBody {
    #[serde(default)]
    room_id: Option<String>,
}

#[derive(Deserialize)]
struct RoomListBody {
    #[serde(default)]
    rooms: Vec<ChatRoomSummary>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl BackendClient {
    /// Homeserver credentials for the signed-in customer.
    pub async fn get_chat_token(&self, session: &Session) -> Result<ChatToken> {
        let body: TokenBody = self
            .send_json(
                Method::POST,
                &["store", "chat", "token"],
                &serde_json::json!({}),
                session,
            )
            .await?;
        match (present(body.access_token), present(body.user_id)) {
            (Some(access_token), Some(user_id)) => Ok(ChatToken {
                access_token,
                user_id,
            }),
            _ => Err(ClientError::Contract("chat token response is incomplete".into())),
        }
    }

    /// Resolves (or creates) the room for a buyer/seller conversation.
    pub async fn get_chat_room(&self, session: &Session, target: &ChatTarget) -> Result<ChatRoom> {
        let body: RoomBody = self
            .send_json(Method::POST, &["store", "chat", "room"], target, session)
            .await?;
        present(body.room_id)
            .map(|room_id| ChatRoom {
                room_id: room_id.into(),
            })
            .ok_or_else(|| ClientError::Contract("chat room response has no room_id".into()))
    }

    pub async fn try_list_chat_rooms(&self, session: &Session) -> Result<Vec<ChatRoomSummary>> {
        let body: RoomListBody = self
            .get(&["store", "chat", "rooms"], NO_QUERY, session)
            .await?;
        Ok(body.rooms)
    }

    pub async fn list_chat_rooms(&self, session: &Session) -> Vec<ChatRoomSummary> {
        self.try_list_chat_rooms(session).await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to fetch chat rooms");
            Vec::new()
        })
    }
}
