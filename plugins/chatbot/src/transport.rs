//! How a chat client reaches the endpoint

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::endpoint::{ChatRequest, ChatResponse, ChatbotEndpoint};
use crate::error::TransportError;

/// Carries one chat request to the endpoint and returns the reply text
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<String, TransportError>;
}

/// Calls an endpoint living in the same process
pub struct EndpointTransport {
    endpoint: Arc<ChatbotEndpoint>,
}

impl EndpointTransport {
    pub fn new(endpoint: Arc<ChatbotEndpoint>) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl ChatTransport for EndpointTransport {
    async fn send(&self, request: &ChatRequest) -> Result<String, TransportError> {
        self.endpoint
            .respond(request.clone())
            .await
            .map(|reply| reply.response)
            .map_err(|e| TransportError::Status(e.status_code()))
    }
}

/// POSTs JSON to a remote `/api/chatbot`
pub struct HttpChatTransport {
    client: Client,
    url: String,
}

impl HttpChatTransport {
    pub fn new(url: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn send(&self, request: &ChatRequest) -> Result<String, TransportError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(reply.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api/chatbot", addr)
    }

    #[tokio::test]
    async fn test_endpoint_transport_uses_mock() {
        let transport = EndpointTransport::new(Arc::new(ChatbotEndpoint::mock_only()));
        let reply = transport.send(&ChatRequest::new("hello")).await.unwrap();
        assert_eq!(reply, "Hello! How can I help you today?");
    }

    #[tokio::test]
    async fn test_endpoint_transport_maps_rejection() {
        let transport = EndpointTransport::new(Arc::new(ChatbotEndpoint::mock_only()));
        let err = transport.send(&ChatRequest::new("")).await.unwrap_err();
        assert_eq!(err, TransportError::Status(400));
    }

    #[tokio::test]
    async fn test_http_transport_round_trip() {
        let app = Router::new().route(
            "/api/chatbot",
            post(|Json(body): Json<Value>| async move {
                Json(json!({"response": format!("echo: {}", body["message"].as_str().unwrap_or(""))}))
            }),
        );
        let url = serve(app).await;

        let transport = HttpChatTransport::new(url).unwrap();
        let reply = transport.send(&ChatRequest::new("ping")).await.unwrap();
        assert_eq!(reply, "echo: ping");
    }

    #[tokio::test]
    async fn test_http_transport_reports_status() {
        let app = Router::new().route(
            "/api/chatbot",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Internal server error"})),
                )
            }),
        );
        let url = serve(app).await;

        let transport = HttpChatTransport::new(url).unwrap();
        let err = transport.send(&ChatRequest::new("ping")).await.unwrap_err();
        assert_eq!(err, TransportError::Status(500));
    }
}
