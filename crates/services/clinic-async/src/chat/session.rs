//! Conversation state for one chat surface.
//!
//! A [`ChatSession`] owns the local message log and the conversation id, and
//! moves between [`ChatState::Idle`], [`ChatState::Sending`] and
//! [`ChatState::Errored`]. At most one send is in flight; a send attempted while
//! one is pending is ignored, not queued.
//!
//! The lock is never held across a transport call. A send future dropped
//! mid-flight puts the session back to [`ChatState::Idle`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{
    transport::ChatTransport,
    types::{ApiHealth, ChatMessage, ChatResult, HistoryEntry, PatientInfo},
};

/// Whether a surface lets the user attach clinical context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientContextMode {
    /// Full-page assistant: context can be toggled on
    Optional,
    /// Floating widget: context is always empty
    Disabled,
}

/// Lifecycle of a chat session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChatState {
    /// Ready to send
    #[default]
    Idle,
    /// A send is in flight
    Sending,
    /// The last send failed; sending again is allowed
    Errored,
}

/// What a call to [`ChatSession::send`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank text or a send already pending; nothing changed
    Ignored,
    /// Assistant reply appended
    Replied,
    /// Transport failed; `last_error` set
    Failed,
    /// The session was cleared while the reply was in flight; reply dropped
    Discarded,
}

/// Render-ready copy of a session's state
#[derive(Debug, Clone, Default)]
pub struct ChatSnapshot {
    /// Local log, oldest first
    pub messages: Vec<ChatMessage>,
    /// Server conversation id, set by the first successful send
    pub conversation_id: Option<String>,
    /// Current state
    pub state: ChatState,
    /// Message of the last failure
    pub last_error: Option<String>,
    /// Unsent input
    pub draft: String,
    /// Clinical context (only sent in [`PatientContextMode::Optional`])
    pub patient_info: PatientInfo,
    /// Whether the context is attached to sends
    pub share_patient_context: bool,
    /// Last health check
    pub api_status: Option<ApiHealth>,
}

impl ChatSnapshot {
    /// True while a send is in flight
    #[must_use]
    pub fn pending(&self) -> bool {
        self.state == ChatState::Sending
    }
}

#[derive(Default)]
struct Inner {
    view: ChatSnapshot,
    // Bumped by clear() so late replies can tell they are stale
    epoch: u64,
}

/// One conversation with the assistant
pub struct ChatSession<T: ChatTransport + ?Sized> {
    transport: Arc<T>,
    mode: PatientContextMode,
    inner: Mutex<Inner>,
}

impl<T: ChatTransport + ?Sized> ChatSession<T> {
    /// Starts an empty session
    #[must_use]
    pub fn new(transport: Arc<T>, mode: PatientContextMode) -> Self {
        Self {
            transport,
            mode,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Context mode fixed at construction
    #[must_use]
    pub const fn mode(&self) -> PatientContextMode {
        self.mode
    }

    /// Copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> ChatSnapshot {
        self.lock().view.clone()
    }

    /// Replaces the unsent input
    pub fn set_draft(&self, text: impl Into<String>) {
        self.lock().view.draft = text.into();
    }

    /// Stores clinical context; ignored when the mode is [`PatientContextMode::Disabled`]
    pub fn set_patient_info(&self, info: PatientInfo) {
        if self.mode == PatientContextMode::Disabled {
            tracing::debug!("patient context is disabled on this surface");
            return;
        }
        self.lock().view.patient_info = info;
    }

    /// Turns context sharing on or off; always off when disabled
    pub fn set_share_patient_context(&self, share: bool) {
        let share = share && self.mode == PatientContextMode::Optional;
        self.lock().view.share_patient_context = share;
    }

    /// Sends the current draft
    pub async fn submit_draft(&self) -> SendOutcome {
        let draft = self.lock().view.draft.clone();
        self.send(&draft).await
    }

    /// Sends `text` as a user message
    ///
    /// The user message is appended before the call and stays even if the call
    /// fails. Blank text, or a call while another send is pending, returns
    /// [`SendOutcome::Ignored`] without touching anything.
    ///
    /// Dropping the returned future before it completes returns the session to
    /// [`ChatState::Idle`] so later sends are accepted.
    pub async fn send(&self, text: &str) -> SendOutcome {
        let content = text.trim();

        let (conversation_id, patient_info, epoch) = {
            let mut inner = self.lock();
            if content.is_empty() || inner.view.state == ChatState::Sending {
                return SendOutcome::Ignored;
            }

            inner.view.messages.push(ChatMessage::user(content));
            inner.view.draft.clear();
            inner.view.state = ChatState::Sending;
            inner.view.last_error = None;

            let patient_info = if self.mode == PatientContextMode::Optional
                && inner.view.share_patient_context
            {
                inner.view.patient_info.normalized()
            } else {
                PatientInfo::default()
            };
            (inner.view.conversation_id.clone(), patient_info, inner.epoch)
        };

        let guard = PendingSend {
            inner: &self.inner,
            epoch,
            armed: true,
        };

        let result = self
            .transport
            .send_message(content, conversation_id.as_deref(), &patient_info)
            .await;

        guard.disarm();
        let mut inner = self.lock();
        if inner.epoch != epoch {
            tracing::debug!("chat reply arrived after the conversation was cleared");
            return SendOutcome::Discarded;
        }

        match result {
            Ok(reply) => {
                inner.view.messages.push(ChatMessage::assistant(reply.response));
                inner.view.conversation_id = Some(reply.conversation_id);
                inner.view.state = ChatState::Idle;
                inner.view.last_error = None;
                SendOutcome::Replied
            }
            Err(failure) => {
                tracing::debug!(error = %failure, "chat send failed");
                inner.view.last_error = Some(failure.message);
                inner.view.state = ChatState::Errored;
                SendOutcome::Failed
            }
        }
    }

    /// Clears the error banner
    pub fn dismiss_error(&self) {
        let mut inner = self.lock();
        inner.view.last_error = None;
        if inner.view.state == ChatState::Errored {
            inner.view.state = ChatState::Idle;
        }
    }

    /// Starts over
    ///
    /// Deletes the server conversation if there is one, best-effort: the outcome
    /// is logged and otherwise ignored. Patient context is reset only on surfaces
    /// that have it.
    pub async fn clear(&self) {
        let conversation_id = {
            let mut inner = self.lock();
            inner.epoch += 1;
            let id = inner.view.conversation_id.take();

            inner.view.messages.clear();
            inner.view.last_error = None;
            inner.view.state = ChatState::Idle;
            if self.mode == PatientContextMode::Optional {
                inner.view.patient_info = PatientInfo::default();
                inner.view.share_patient_context = false;
            }
            id
        };

        if let Some(id) = conversation_id
            && let Err(failure) = self.transport.delete_conversation(&id).await
        {
            tracing::debug!(conversation_id = %id, error = %failure, "conversation delete failed");
        }
    }

    /// Checks the service and records the result
    pub async fn refresh_health(&self) -> ApiHealth {
        let health = ApiHealth::from(self.transport.check_health().await);
        self.lock().view.api_status = Some(health.clone());
        health
    }

    /// Server-side log of the current conversation, if one exists
    pub async fn fetch_history(&self) -> Option<ChatResult<Vec<HistoryEntry>>> {
        let id = self.lock().view.conversation_id.clone()?;
        Some(self.transport.get_history(&id).await)
    }
}

/// Resets an abandoned send; disarmed once the transport call returns
struct PendingSend<'a> {
    inner: &'a Mutex<Inner>,
    epoch: u64,
    armed: bool,
}

impl PendingSend<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingSend<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        // A clear() in between already reset the state
        if inner.epoch == self.epoch && inner.view.state == ChatState::Sending {
            tracing::debug!("chat send abandoned before the reply arrived");
            inner.view.state = ChatState::Idle;
        }
    }
}
