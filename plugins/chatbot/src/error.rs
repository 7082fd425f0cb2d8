//! Error types for chat mediation

use thiserror::Error;
use trellis_core::TrellisError;

/// Failures the endpoint reports to its caller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatbotError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Message is required")]
    MessageRequired,

    /// Detail is logged, never sent to the caller
    #[error("Internal server error")]
    Internal(String),
}

impl ChatbotError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ChatbotError::MethodNotAllowed => 405,
            ChatbotError::MessageRequired => 400,
            ChatbotError::Internal(_) => 500,
        }
    }

    /// `{"error": ..}` wire body
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }
}

impl From<ChatbotError> for TrellisError {
    fn from(err: ChatbotError) -> Self {
        match err {
            ChatbotError::Internal(detail) => TrellisError::chatbot(detail),
            other => TrellisError::chatbot(other.to_string()),
        }
    }
}

/// Upstream chat-completion failures. Always absorbed by the mock fallback.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider request failed: {0}")]
    Transport(String),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Transport(format!("timed out: {}", err))
        } else if err.is_decode() {
            ProviderError::MalformedResponse(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

impl From<ProviderError> for TrellisError {
    fn from(err: ProviderError) -> Self {
        TrellisError::chatbot(err.to_string())
    }
}

/// Failures while a client talks to the endpoint
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("endpoint returned status {0}")]
    Status(u16),

    #[error("could not decode endpoint reply: {0}")]
    Decode(String),
}

impl From<TransportError> for TrellisError {
    fn from(err: TransportError) -> Self {
        TrellisError::chatbot(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_wire_bodies() {
        assert_eq!(ChatbotError::MethodNotAllowed.status_code(), 405);
        assert_eq!(
            ChatbotError::MethodNotAllowed.to_body(),
            serde_json::json!({"error": "Method not allowed"})
        );
        assert_eq!(
            ChatbotError::MessageRequired.to_body(),
            serde_json::json!({"error": "Message is required"})
        );

        let internal = ChatbotError::Internal("provider task panicked".to_string());
        assert_eq!(internal.status_code(), 500);
        assert_eq!(
            internal.to_body(),
            serde_json::json!({"error": "Internal server error"})
        );
    }

    #[test]
    fn test_conversion_into_core_error() {
        let err: TrellisError = ProviderError::Status {
            status: 401,
            body: "invalid key".to_string(),
        }
        .into();
        assert!(err.to_string().contains("401"));
    }
}
