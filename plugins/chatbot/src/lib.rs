//! Chatbot plugin for Trellis
//!
//! Mediates chat between page visitors and a chat-completion provider. The
//! endpoint validates requests and prefers a live provider; when none is
//! configured, or the call fails, replies come from a deterministic mock
//! responder. [`ChatClient`] keeps the visitor-side transcript.

pub mod client;
pub mod endpoint;
pub mod error;
pub mod mock;
pub mod provider;
pub mod transport;

#[cfg(test)]
mod endpoint_test;

pub use client::{ChatClient, ChatMessage, ChatSnapshot, Role, ERROR_REPLY};
pub use endpoint::{
    system_instruction, ChatRequest, ChatResponse, ChatbotEndpoint, EndpointReply, FALLBACK_NOTE,
};
pub use error::{ChatbotError, ProviderError, TransportError};
pub use mock::mock_response;
pub use provider::{CompletionProvider, CompletionRequest, OpenAiProvider};
pub use transport::{ChatTransport, EndpointTransport, HttpChatTransport};
