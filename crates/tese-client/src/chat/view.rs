//! A live chat window: initial load, periodic refresh, sending.
//!
//! State is only touched while the view is live. Every fetch remembers the
//! activation epoch it started in and drops its result if the view was
//! deactivated (or re-activated) before the answer arrived.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use tese_shared::chat::{ChatMessage, Transcript};
use tese_shared::{ChatError, EventId};

use super::{ChatProvider, ChatSession};

pub const LOAD_FAILED_MESSAGE: &str = "Could not load messages.";
pub const SEND_FAILED_MESSAGE: &str = "Could not send message.";

/// What the chat window renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatViewState {
    pub messages: Vec<ChatMessage>,
    /// Transient error; cleared by the next successful fetch or send.
    pub error: Option<String>,
    pub loading: bool,
    pub sending: bool,
    pub input: String,
}

#[derive(Default)]
struct Shared {
    transcript: Transcript,
    error: Option<String>,
    loading: bool,
    sending: bool,
    input: String,
}

struct Inner {
    provider: Arc<dyn ChatProvider>,
    chat: ChatSession,
    page_size: u32,
    live: AtomicBool,
    epoch: AtomicU64,
    shared: Mutex<Shared>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_epoch(&self) -> Option<u64> {
        self.live
            .load(Ordering::Acquire)
            .then(|| self.epoch.load(Ordering::Acquire))
    }

    fn still_current(&self, epoch: u64) -> bool {
        self.current_epoch() == Some(epoch)
    }

    async fn refresh(&self) {
        let Some(epoch) = self.current_epoch() else {
            return;
        };
        let result = self.provider.list_messages(&self.chat, self.page_size).await;
        if !self.still_current(epoch) {
            debug!(room_id = %self.chat.room_id, "Dropping chat fetch for inactive view");
            return;
        }

        let mut shared = self.lock();
        shared.loading = false;
        match result {
            Ok(batch) => {
                let outcome = shared.transcript.merge(batch);
                shared.error = None;
                if outcome.added > 0 {
                    debug!(
                        room_id = %self.chat.room_id,
                        added = outcome.added,
                        total = shared.transcript.len(),
                        "Chat messages merged"
                    );
                }
            }
            Err(e) => {
                warn!(room_id = %self.chat.room_id, error = %e, "Chat fetch failed");
                shared.error = Some(LOAD_FAILED_MESSAGE.to_string());
            }
        }
    }
}

pub struct ChatView {
    inner: Arc<Inner>,
    poll_interval: Duration,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl ChatView {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        chat: ChatSession,
        page_size: u32,
        poll_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                chat,
                page_size,
                live: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
                shared: Mutex::new(Shared::default()),
            }),
            poll_interval,
            poller: Mutex::new(None),
        }
    }

    pub fn chat(&self) -> &ChatSession {
        &self.inner.chat
    }

    pub fn is_live(&self) -> bool {
        self.inner.live.load(Ordering::Acquire)
    }

    /// Joins the room, loads the latest page and starts polling.
    pub async fn activate(&self) {
        self.inner.epoch.fetch_add(1, Ordering::AcqRel);
        self.inner.live.store(true, Ordering::Release);
        self.inner.lock().loading = true;

        if let Err(e) = self.inner.provider.join(&self.inner.chat).await {
            // Already-joined rooms answer with an error on some servers.
            debug!(room_id = %self.inner.chat.room_id, error = %e, "Join failed, continuing");
        }
        self.inner.refresh().await;
        if !self.is_live() {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let period = self.poll_interval.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; the initial load already ran.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !inner.live.load(Ordering::Acquire) {
                    break;
                }
                inner.refresh().await;
            }
        });
        if let Some(previous) = self.lock_poller().replace(handle) {
            previous.abort();
        }
    }

    /// Fetches the latest page now.
    pub async fn refresh(&self) {
        self.inner.refresh().await;
    }

    pub fn set_input(&self, text: impl Into<String>) {
        if self.is_live() {
            self.inner.lock().input = text.into();
        }
    }

    /// Sends the current input.
    pub async fn send_input(&self) -> Result<Option<EventId>, ChatError> {
        let body = self.inner.lock().input.clone();
        self.send(&body).await
    }

    /// Sends `body`, clears the input and re-fetches so the message shows
    /// up with its server timestamp. Only one send runs at a time.
    pub async fn send(&self, body: &str) -> Result<Option<EventId>, ChatError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let Some(epoch) = self.inner.current_epoch() else {
            return Err(ChatError::SessionUnavailable);
        };
        {
            let mut shared = self.inner.lock();
            if shared.sending {
                debug!(room_id = %self.inner.chat.room_id, "Chat send already in flight");
                return Err(ChatError::SendInProgress);
            }
            shared.input.clear();
            shared.sending = true;
        }

        let result = self.inner.provider.send_message(&self.inner.chat, body).await;
        if !self.inner.still_current(epoch) {
            return result;
        }
        {
            let mut shared = self.inner.lock();
            shared.sending = false;
            match &result {
                Ok(_) => shared.error = None,
                Err(e) => {
                    warn!(room_id = %self.inner.chat.room_id, error = %e, "Chat send failed");
                    shared.error = Some(SEND_FAILED_MESSAGE.to_string());
                }
            }
        }
        if result.is_ok() {
            self.inner.refresh().await;
        }
        result
    }

    /// Stops polling. Fetches still in flight are discarded when they land.
    pub fn deactivate(&self) {
        self.inner.live.store(false, Ordering::Release);
        if let Some(handle) = self.lock_poller().take() {
            handle.abort();
        }
    }

    pub fn snapshot(&self) -> ChatViewState {
        let shared = self.inner.lock();
        ChatViewState {
            messages: shared.transcript.messages().to_vec(),
            error: shared.error.clone(),
            loading: shared.loading,
            sending: shared.sending,
            input: shared.input.clone(),
        }
    }

    fn lock_poller(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ChatView {
    fn drop(&mut self) {
        self.deactivate();
    }
}
