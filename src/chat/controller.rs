//! Chat thread controller — owns the message log of the open chat and runs
//! grounded, ungrounded and refinement round trips against the backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

use super::model::{ChatId, Message, MessageId, MessageLog};
use crate::backend::ChatBackend;
use crate::error::{LoadError, SendError};

const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Events emitted whenever the visible thread changes.
#[derive(Debug, Clone)]
pub enum ThreadEvent {
    /// History replaced after a successful load.
    ThreadLoaded { chat_id: ChatId, count: usize },
    /// History could not be loaded; the log is empty.
    LoadFailed { chat_id: ChatId, reason: String },
    /// A round trip started; the input affordance should be disabled.
    SendStarted,
    /// Messages appended as one update.
    MessagesAppended { messages: Vec<Message> },
    /// A round trip failed; the log is unchanged.
    SendFailed { reason: String },
}

#[derive(Default)]
struct ThreadState {
    chat_id: Option<ChatId>,
    log: MessageLog,
}

/// Clears the in-flight flag on every exit path of a send.
struct PendingGuard<'a>(&'a AtomicBool);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Controller for one open chat.
pub struct ChatThreadController {
    backend: Arc<dyn ChatBackend>,
    state: RwLock<ThreadState>,
    pending: AtomicBool,
    tx: broadcast::Sender<ThreadEvent>,
}

impl ChatThreadController {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Arc::new(Self {
            backend,
            state: RwLock::new(ThreadState::default()),
            pending: AtomicBool::new(false),
            tx,
        })
    }

    /// Subscribe to thread change events.
    pub fn subscribe(&self) -> broadcast::Receiver<ThreadEvent> {
        self.tx.subscribe()
    }

    /// Whether a send is currently in flight.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub async fn active_chat(&self) -> Option<ChatId> {
        self.state.read().await.chat_id.clone()
    }

    /// Snapshot of the current log.
    pub async fn log(&self) -> MessageLog {
        self.state.read().await.log.clone()
    }

    /// Make `chat_id` the active chat and replace the log with its history.
    ///
    /// The log is cleared before the request, so on failure it stays empty.
    pub async fn load_thread(&self, chat_id: ChatId) -> Result<usize, LoadError> {
        {
            let mut state = self.state.write().await;
            state.chat_id = Some(chat_id.clone());
            state.log.clear();
        }

        debug!(chat_id = %chat_id, "Loading chat history");

        match self.backend.load_thread(&chat_id).await {
            Ok(messages) => {
                let count = messages.len();
                self.state.write().await.log = MessageLog::from_messages(messages);
                info!(chat_id = %chat_id, count, "Chat history loaded");
                let _ = self.tx.send(ThreadEvent::ThreadLoaded { chat_id, count });
                Ok(count)
            }
            Err(e) => {
                warn!(chat_id = %chat_id, error = %e, "Failed to load chat history");
                let _ = self.tx.send(ThreadEvent::LoadFailed {
                    chat_id: chat_id.clone(),
                    reason: e.to_string(),
                });
                Err(LoadError::Backend {
                    chat_id: chat_id.0,
                    source: e,
                })
            }
        }
    }

    /// Close the active chat and drop its log.
    pub async fn close(&self) {
        let mut state = self.state.write().await;
        state.chat_id = None;
        state.log.clear();
    }

    /// Ask a document-grounded question. The user's message and the reply are
    /// appended together once the round trip succeeds.
    pub async fn send_grounded(&self, text: &str) -> Result<[Message; 2], SendError> {
        let (chat_id, _guard) = self.begin_send(text).await?;

        let answer = match self.backend.ask_grounded(&chat_id, text).await {
            Ok(answer) => answer,
            Err(e) => return Err(self.fail_send(e.into())),
        };

        let pair = [answer.user_message, answer.ai_message];
        self.append(pair.to_vec()).await;
        info!(chat_id = %chat_id, "Grounded answer appended");
        Ok(pair)
    }

    /// Ask a question without document context. Only the reply is appended.
    pub async fn send_ungrounded(&self, text: &str) -> Result<Message, SendError> {
        let (chat_id, _guard) = self.begin_send(text).await?;

        let reply = match self.backend.ask_ungrounded(&chat_id, text).await {
            Ok(reply) => reply,
            Err(e) => return Err(self.fail_send(e.into())),
        };

        self.append(vec![reply.clone()]).await;
        info!(chat_id = %chat_id, "Ungrounded answer appended");
        Ok(reply)
    }

    /// Re-ask the question behind an assistant reply without document context.
    ///
    /// Picks the last-arrived user message timestamped at or before the
    /// target reply. Returns `Ok(None)` without sending anything when there is
    /// no such message.
    pub async fn refine(&self, assistant_message_id: &MessageId) -> Result<Option<Message>, SendError> {
        let question = {
            let state = self.state.read().await;
            let target = state
                .log
                .get(assistant_message_id)
                .ok_or_else(|| SendError::UnknownMessage(assistant_message_id.to_string()))?;
            if !target.is_assistant() {
                return Err(SendError::NotAssistantMessage(assistant_message_id.to_string()));
            }
            state
                .log
                .last_user_at_or_before(target.timestamp)
                .map(|m| m.text.clone())
        };

        let Some(question) = question else {
            debug!(message_id = %assistant_message_id, "No question to refine");
            return Ok(None);
        };

        self.send_ungrounded(&question).await.map(Some)
    }

    /// Validate a send and claim the in-flight slot.
    async fn begin_send(&self, text: &str) -> Result<(ChatId, PendingGuard<'_>), SendError> {
        if text.trim().is_empty() {
            return Err(SendError::EmptyMessage);
        }
        let chat_id = self
            .state
            .read()
            .await
            .chat_id
            .clone()
            .ok_or(SendError::NoActiveChat)?;

        if self
            .pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(chat_id = %chat_id, "Send rejected, another is in flight");
            return Err(SendError::Busy);
        }

        let _ = self.tx.send(ThreadEvent::SendStarted);
        Ok((chat_id, PendingGuard(&self.pending)))
    }

    fn fail_send(&self, err: SendError) -> SendError {
        warn!(error = %err, "Send failed");
        let _ = self.tx.send(ThreadEvent::SendFailed {
            reason: err.to_string(),
        });
        err
    }

    async fn append(&self, messages: Vec<Message>) {
        self.state.write().await.log.extend(messages.iter().cloned());
        let _ = self.tx.send(ThreadEvent::MessagesAppended { messages });
    }
}
