//! Chat-completion providers

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use trellis_core::ChatbotConfig;

use crate::error::ProviderError;

/// One system instruction plus one user message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
}

/// A remote model that turns a [`CompletionRequest`] into reply text
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;

    /// Provider name for logs
    fn name(&self) -> &str {
        "provider"
    }
}

#[derive(Serialize, Debug)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize, Debug)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize, Debug)]
struct CompletionReply {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: Option<ReplyMessage>,
}

#[derive(Deserialize, Debug)]
struct ReplyMessage {
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` client
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiProvider {
    pub fn new(config: &ChatbotConfig, api_key: String) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ProviderError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Build a provider when the configured credential is present
    pub fn from_config(config: &ChatbotConfig) -> Result<Option<Self>, ProviderError> {
        match config.api_key() {
            Some(key) => Self::new(config, key).map(Some),
            None => Ok(None),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let body = CompletionBody {
            model: &self.model,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: &request.system,
                },
                WireMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: CompletionReply = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| {
                ProviderError::MalformedResponse("missing choices[0].message.content".to_string())
            })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct Upstream {
        status: StatusCode,
        reply: Value,
        seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    }

    async fn completions(
        State(upstream): State<Upstream>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        upstream.seen.lock().unwrap().push((auth, body));
        (upstream.status, Json(upstream.reply.clone()))
    }

    async fn spawn_upstream(upstream: Upstream) -> String {
        let app = Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(upstream);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    fn provider_for(api_base: String) -> OpenAiProvider {
        let config = ChatbotConfig {
            api_base,
            request_timeout_secs: 5,
            ..ChatbotConfig::default()
        };
        OpenAiProvider::new(&config, "sk-test".to_string()).unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: "You are a helpful assistant.".to_string(),
            user: "What do you sell?".to_string(),
        }
    }

    #[tokio::test]
    async fn test_successful_completion() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let base = spawn_upstream(Upstream {
            status: StatusCode::OK,
            reply: json!({"choices": [{"message": {"role": "assistant", "content": "Widgets."}}]}),
            seen: seen.clone(),
        })
        .await;

        let reply = provider_for(base).complete(&request()).await.unwrap();
        assert_eq!(reply, "Widgets.");

        let seen = seen.lock().unwrap();
        let (auth, body) = &seen[0];
        assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "What do you sell?");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let base = spawn_upstream(Upstream {
            status: StatusCode::UNAUTHORIZED,
            reply: json!({"error": {"message": "bad key"}}),
            seen: Arc::new(Mutex::new(Vec::new())),
        })
        .await;

        let err = provider_for(base).complete(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_missing_content_is_malformed() {
        let base = spawn_upstream(Upstream {
            status: StatusCode::OK,
            reply: json!({"choices": []}),
            seen: Arc::new(Mutex::new(Vec::new())),
        })
        .await;

        let err = provider_for(base).complete(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = provider_for(format!("http://{}/v1", addr))
            .complete(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
    }

    #[test]
    fn test_endpoint_joins_base() {
        let provider = provider_for("https://api.example.com/v1/".to_string());
        assert_eq!(
            provider.endpoint(),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_no_credential_no_provider() {
        let config = ChatbotConfig {
            api_key_env: "TRELLIS_TEST_NO_SUCH_KEY".to_string(),
            ..ChatbotConfig::default()
        };
        assert!(OpenAiProvider::from_config(&config).unwrap().is_none());
    }
}
