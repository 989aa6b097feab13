use reqwest::Method;
use serde::Deserialize;

use tese_shared::negotiation::{MessageDraft, NegotiationMessage, NegotiationThread};
use tese_shared::{ListParams, Page, ThreadId};

use super::{found_or_none, page_or_empty, BackendClient, NO_QUERY};
use crate::error::{ClientError, Result};
use crate::session::Session;

#[derive(Deserialize)]
struct NegotiationListBody {
    #[serde(default)]
    negotiations: Vec<NegotiationThread>,
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    offset: Option<u32>,
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Deserialize)]
struct NegotiationBody {
    negotiation: NegotiationThread,
}

#[derive(Deserialize)]
struct MessageListBody {
    #[serde(default)]
    messages: Vec<NegotiationMessage>,
    #[serde(default)]
    count: Option<u64>,
}

#[derive(Deserialize)]
struct MessageBody {
    message: NegotiationMessage,
}

impl BackendClient {
    pub async fn try_list_negotiations(
        &self,
        session: &Session,
        params: &ListParams,
    ) -> Result<Page<NegotiationThread>> {
        let body: NegotiationListBody = self.get(&["store", "negotiations"], params, session).await?;
        Ok(Page {
            count: body.count.unwrap_or(body.negotiations.len() as u64),
            offset: body.offset.unwrap_or(params.offset),
            limit: body.limit.unwrap_or(params.limit),
            items: body.negotiations,
        })
    }

    pub async fn list_negotiations(
        &self,
        session: &Session,
        params: &ListParams,
    ) -> Page<NegotiationThread> {
        page_or_empty(
            self.try_list_negotiations(session, params).await,
            params.limit,
            "negotiations",
        )
    }

    pub async fn try_get_negotiation(
        &self,
        session: &Session,
        id: &ThreadId,
    ) -> Result<NegotiationThread> {
        let body: NegotiationBody = self
            .get(&["store", "negotiations", id.as_str()], NO_QUERY, session)
            .await?;
        Ok(body.negotiation)
    }

    pub async fn get_negotiation(&self, session: &Session, id: &ThreadId) -> Option<NegotiationThread> {
        found_or_none(
            self.try_get_negotiation(session, id).await,
            "negotiation",
            id.as_str(),
        )
    }

    /// Messages in the order the backend returns them (oldest first).
    pub async fn try_list_negotiation_messages(
        &self,
        session: &Session,
        id: &ThreadId,
        params: &ListParams,
    ) -> Result<Page<NegotiationMessage>> {
        let body: MessageListBody = self
            .get(&["store", "negotiations", id.as_str(), "messages"], params, session)
            .await?;
        Ok(Page {
            count: body.count.unwrap_or(body.messages.len() as u64),
            offset: params.offset,
            limit: params.limit,
            items: body.messages,
        })
    }

    pub async fn list_negotiation_messages(
        &self,
        session: &Session,
        id: &ThreadId,
        params: &ListParams,
    ) -> Page<NegotiationMessage> {
        page_or_empty(
            self.try_list_negotiation_messages(session, id, params).await,
            params.limit,
            "negotiation messages",
        )
    }

    /// Sends a message after checking it against the thread's current
    /// server state.
    pub async fn send_negotiation_message(
        &self,
        session: &Session,
        id: &ThreadId,
        draft: &MessageDraft,
    ) -> Result<NegotiationMessage> {
        let thread = self.try_get_negotiation(session, id).await?;
        self.send_in_thread(session, &thread, draft).await
    }

    /// Same as [`send_negotiation_message`](Self::send_negotiation_message)
    /// against an already loaded thread snapshot.
    pub async fn send_in_thread(
        &self,
        session: &Session,
        thread: &NegotiationThread,
        draft: &MessageDraft,
    ) -> Result<NegotiationMessage> {
        let draft = draft.clone().trimmed();
        thread.check_send(&draft)?;

        let body: MessageBody = self
            .send_json(
                Method::POST,
                &["store", "negotiations", thread.id.as_str(), "messages"],
                &draft,
                session,
            )
            .await?;
        if body.message.thread_id != thread.id {
            return Err(ClientError::Contract(format!(
                "message {} was stored in thread {} instead of {}",
                body.message.id, body.message.thread_id, thread.id
            )));
        }
        tracing::debug!(
            thread_id = %thread.id,
            message_id = %body.message.id,
            message_type = body.message.message_type.as_str(),
            "Negotiation message sent"
        );
        Ok(body.message)
    }
}
