//! Chat client: a linear transcript with a single in-flight request

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::endpoint::ChatRequest;
use crate::transport::ChatTransport;

/// Assistant text shown when a request fails for any reason
pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Point-in-time copy of a client's state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSnapshot {
    pub transcript: Vec<ChatMessage>,
    pub draft: String,
    pub pending: bool,
}

#[derive(Debug, Default)]
struct ClientState {
    transcript: Vec<ChatMessage>,
    draft: String,
    pending: bool,
    initial_prompt: String,
    context: String,
}

pub struct ChatClient {
    transport: Arc<dyn ChatTransport>,
    state: Mutex<ClientState>,
}

impl ChatClient {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        initial_prompt: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            state: Mutex::new(ClientState {
                initial_prompt: initial_prompt.into(),
                context: context.into(),
                ..ClientState::default()
            }),
        }
    }

    // Never held across an await
    fn state(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_draft(&self, draft: impl Into<String>) {
        self.state().draft = draft.into();
    }

    pub fn set_initial_prompt(&self, prompt: impl Into<String>) {
        self.state().initial_prompt = prompt.into();
    }

    pub fn set_context(&self, context: impl Into<String>) {
        self.state().context = context.into();
    }

    pub fn is_pending(&self) -> bool {
        self.state().pending
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.state().transcript.clone()
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        let state = self.state();
        ChatSnapshot {
            transcript: state.transcript.clone(),
            draft: state.draft.clone(),
            pending: state.pending,
        }
    }

    /// Send the current draft.
    ///
    /// Returns `false` without doing anything when the draft is blank or a
    /// request is already pending.
    pub async fn submit(&self) -> bool {
        let request = {
            let mut state = self.state();
            if state.pending || state.draft.trim().is_empty() {
                return false;
            }
            let message = std::mem::take(&mut state.draft);
            Self::begin(&mut state, message)
        };
        self.exchange(request).await;
        true
    }

    /// Send `message` directly, leaving the draft alone. Same rules as [`submit`](Self::submit).
    pub async fn send(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        let request = {
            let mut state = self.state();
            if state.pending || message.trim().is_empty() {
                return false;
            }
            Self::begin(&mut state, message)
        };
        self.exchange(request).await;
        true
    }

    fn begin(state: &mut ClientState, message: String) -> ChatRequest {
        state.transcript.push(ChatMessage::user(message.clone()));
        state.pending = true;

        ChatRequest {
            message,
            initial_prompt: Some(state.initial_prompt.clone()).filter(|p| !p.is_empty()),
            context: Some(state.context.clone()).filter(|c| !c.is_empty()),
        }
    }

    async fn exchange(&self, request: ChatRequest) {
        let guard = InFlight {
            client: self,
            finished: false,
        };

        let reply = match self.transport.send(&request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Chat request failed: {}", e);
                ERROR_REPLY.to_string()
            }
        };

        guard.finish(reply);
    }
}

/// Answers an abandoned request with [`ERROR_REPLY`] so the client never stays pending
struct InFlight<'a> {
    client: &'a ChatClient,
    finished: bool,
}

impl InFlight<'_> {
    fn finish(mut self, reply: String) {
        self.finished = true;
        let mut state = self.client.state();
        state.transcript.push(ChatMessage::assistant(reply));
        state.pending = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("Chat request abandoned before a reply arrived");
            let mut state = self.client.state();
            state.transcript.push(ChatMessage::assistant(ERROR_REPLY));
            state.pending = false;
        }
    }
}
