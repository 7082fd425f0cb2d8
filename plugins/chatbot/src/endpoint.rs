//! Server side of the chat contract: validate, call the provider, fall back

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use trellis_core::{ChatbotConfig, EventBus, SystemEvent};

use crate::error::{ChatbotError, ProviderError};
use crate::mock::mock_response;
use crate::provider::{CompletionProvider, CompletionRequest, OpenAiProvider};

/// Appended to the mock reply when the provider call failed
pub const FALLBACK_NOTE: &str = " (Note: OpenAI API call failed, using fallback response)";

const BASE_INSTRUCTION: &str = "You are a helpful assistant.";

/// Chat request body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(
        rename = "initialPrompt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub initial_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Parse a raw body leniently. Anything without a non-empty string
    /// `message` is rejected; optional fields of the wrong type are dropped.
    pub fn from_json(body: &[u8]) -> Result<Self, ChatbotError> {
        let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);

        let message = value
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .ok_or(ChatbotError::MessageRequired)?;
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

        Ok(Self {
            message: message.to_string(),
            initial_prompt: text("initialPrompt"),
            context: text("context"),
        })
    }
}

/// Chat success body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Status code and JSON body, ready for any HTTP layer
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointReply {
    pub status: u16,
    pub body: Value,
}

impl EndpointReply {
    fn error(err: &ChatbotError) -> Self {
        Self {
            status: err.status_code(),
            body: err.to_body(),
        }
    }
}

/// System instruction: the base sentence plus page context and initial
/// prompt clauses, each only when non-empty
pub fn system_instruction(initial_prompt: Option<&str>, context: Option<&str>) -> String {
    let mut instruction = BASE_INSTRUCTION.to_string();
    if let Some(context) = context.filter(|c| !c.is_empty()) {
        instruction.push_str(&format!(" The current page content is: \"{}\"", context));
    }
    if let Some(prompt) = initial_prompt.filter(|p| !p.is_empty()) {
        instruction.push_str(&format!(" The user's initial prompt was: \"{}\"", prompt));
    }
    instruction
}

/// Stateless chat endpoint
#[derive(Clone, Default)]
pub struct ChatbotEndpoint {
    provider: Option<Arc<dyn CompletionProvider>>,
    event_bus: Option<Arc<dyn EventBus>>,
}

impl ChatbotEndpoint {
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>) -> Self {
        Self {
            provider,
            event_bus: None,
        }
    }

    /// Endpoint that always answers from the mock responder
    pub fn mock_only() -> Self {
        Self::default()
    }

    /// Use the OpenAI provider when the configured credential is set
    pub fn from_config(config: &ChatbotConfig) -> Result<Self, ProviderError> {
        let provider = OpenAiProvider::from_config(config)?
            .map(|p| Arc::new(p) as Arc<dyn CompletionProvider>);
        if provider.is_none() {
            tracing::warn!(
                "{} not set, chatbot will use mock responses",
                config.api_key_env
            );
        }
        Ok(Self::new(provider))
    }

    /// Publish a `ChatFallback` event whenever the provider fails
    pub fn with_event_bus(mut self, event_bus: Arc<dyn EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Full wire contract: verb check, body validation, reply or error body
    pub async fn handle(&self, method: &str, body: &[u8]) -> EndpointReply {
        if !method.eq_ignore_ascii_case("POST") {
            return EndpointReply::error(&ChatbotError::MethodNotAllowed);
        }

        let request = match ChatRequest::from_json(body) {
            Ok(request) => request,
            Err(e) => return EndpointReply::error(&e),
        };

        match self.respond(request).await {
            Ok(reply) => EndpointReply {
                status: 200,
                body: serde_json::json!({ "response": reply.response }),
            },
            Err(e) => {
                if let ChatbotError::Internal(detail) = &e {
                    tracing::error!("Error in chatbot endpoint: {}", detail);
                }
                EndpointReply::error(&e)
            }
        }
    }

    /// Answer a validated request. Provider failures never surface here.
    pub async fn respond(&self, request: ChatRequest) -> Result<ChatResponse, ChatbotError> {
        if request.message.is_empty() {
            return Err(ChatbotError::MessageRequired);
        }

        let prompt = request.initial_prompt.as_deref();
        let context = request.context.as_deref();

        let Some(provider) = self.provider.clone() else {
            tracing::debug!("No provider credential, using mock response");
            return Ok(ChatResponse {
                response: mock_response(&request.message, prompt, context),
            });
        };

        let completion = CompletionRequest {
            system: system_instruction(prompt, context),
            user: request.message.clone(),
        };

        // Provider panics surface as internal faults
        let outcome = tokio::spawn(async move { provider.complete(&completion).await })
            .await
            .map_err(|e| ChatbotError::Internal(format!("provider task failed: {}", e)))?;

        match outcome {
            Ok(text) => Ok(ChatResponse { response: text }),
            Err(e) => {
                tracing::warn!("Chat provider call failed, using fallback: {}", e);
                self.publish_fallback(&e).await;
                Ok(ChatResponse {
                    response: format!(
                        "{}{}",
                        mock_response(&request.message, prompt, context),
                        FALLBACK_NOTE
                    ),
                })
            }
        }
    }

    async fn publish_fallback(&self, error: &ProviderError) {
        if let Some(bus) = &self.event_bus {
            if let Err(e) = bus
                .publish_system_event(SystemEvent::chat_fallback(error.to_string()))
                .await
            {
                tracing::warn!("Failed to publish chat fallback event: {}", e);
            }
        }
    }
}
