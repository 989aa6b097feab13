//! Buyer view of one negotiation thread with optimistic sends.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, warn};

use tese_shared::negotiation::{
    MessageDraft, NegotiationLedger, NegotiationMessage, SenderType,
};
use tese_shared::{ListParams, MessageId, ThreadId};

use crate::backend::BackendClient;
use crate::error::{ClientError, Result};
use crate::overlay::PendingOverlay;
use crate::session::Session;

/// Messages loaded with a thread.
pub const HISTORY_LIMIT: u32 = 100;

#[derive(Debug)]
pub struct NegotiationView {
    backend: BackendClient,
    session: Session,
    thread_id: ThreadId,
    state: Mutex<PendingOverlay<NegotiationLedger>>,
}

impl NegotiationView {
    /// Loads the thread and its history together.
    pub async fn load(backend: BackendClient, session: Session, thread_id: ThreadId) -> Result<Self> {
        let ledger = fetch_ledger(&backend, &session, &thread_id).await?;
        Ok(Self {
            backend,
            session,
            thread_id,
            state: Mutex::new(PendingOverlay::new(ledger)),
        })
    }

    pub fn thread_id(&self) -> &ThreadId {
        &self.thread_id
    }

    /// Current view, including a message still being sent.
    pub fn snapshot(&self) -> NegotiationLedger {
        self.lock().view().clone()
    }

    pub fn is_sending(&self) -> bool {
        self.lock().is_pending()
    }

    /// Re-reads the thread from the backend.
    pub async fn refresh(&self) -> Result<()> {
        let ledger = fetch_ledger(&self.backend, &self.session, &self.thread_id).await?;
        self.lock().refresh(ledger);
        Ok(())
    }

    /// Sends `draft` as the buyer. The message shows up immediately; the
    /// view settles on the server's thread once the backend answers, or
    /// returns to its previous state if the send fails.
    pub async fn send(&self, draft: MessageDraft) -> Result<NegotiationMessage> {
        let draft = draft.trimmed();
        let (pending, thread) = {
            let mut state = self.lock();
            let mut optimistic = state.view().clone();
            let thread = optimistic.thread().clone();
            thread.check_send(&draft)?;

            let placeholder = NegotiationMessage {
                id: MessageId::new(format!("pending_{}", Utc::now().timestamp_millis())),
                thread_id: thread.id.clone(),
                sender_id: thread.buyer_id.clone(),
                sender_type: SenderType::Buyer,
                message_type: draft.message_type,
                content: draft.content.clone(),
                proposal_data: draft.proposal_data.clone(),
                attachments: Vec::new(),
                is_read: true,
                created_at: Utc::now(),
            };
            optimistic.append(placeholder)?;
            let pending = state.begin(optimistic).ok_or(ClientError::InFlight)?;
            (pending, thread)
        };

        let message = match self.backend.send_in_thread(&self.session, &thread, &draft).await {
            Ok(message) => message,
            Err(e) => {
                self.lock().rollback(pending);
                warn!(thread_id = %self.thread_id, error = %e, "Negotiation send failed, rolled back");
                return Err(e);
            }
        };

        match fetch_ledger(&self.backend, &self.session, &self.thread_id).await {
            Ok(server) => {
                self.lock().confirm(pending, server);
            }
            Err(e) => {
                // Stored but not re-read: settle on the confirmed copy plus
                // the server's message.
                warn!(thread_id = %self.thread_id, error = %e, "Thread refresh after send failed");
                let mut state = self.lock();
                let mut ledger = state.confirmed().clone();
                if ledger.append(message.clone()).is_ok() {
                    state.confirm(pending, ledger);
                } else {
                    state.rollback(pending);
                }
            }
        }
        debug!(thread_id = %self.thread_id, message_id = %message.id, "Negotiation view settled");
        Ok(message)
    }

    fn lock(&self) -> MutexGuard<'_, PendingOverlay<NegotiationLedger>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn fetch_ledger(
    backend: &BackendClient,
    session: &Session,
    thread_id: &ThreadId,
) -> Result<NegotiationLedger> {
    let params = ListParams::new(HISTORY_LIMIT);
    let (thread, messages) = futures::try_join!(
        backend.try_get_negotiation(session, thread_id),
        backend.try_list_negotiation_messages(session, thread_id, &params),
    )?;
    Ok(NegotiationLedger::new(thread, messages.items))
}
