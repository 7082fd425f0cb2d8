//! Error handling for the Trellis system

use thiserror::Error;

/// Result type alias for Trellis operations
pub type Result<T> = std::result::Result<T, TrellisError>;

/// Main error type for the Trellis system
#[derive(Error, Debug)]
pub enum TrellisError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Plugin-related errors
    #[error("Plugin error: {0}")]
    Plugin(String),

    /// Event bus errors
    #[error("Event bus error: {0}")]
    EventBus(String),

    /// Page editor errors
    #[error("Editor error: {0}")]
    Editor(String),

    /// Chatbot mediation errors
    #[error("Chatbot error: {0}")]
    Chatbot(String),

    /// Network/server errors
    #[error("Server error: {0}")]
    Server(String),

    /// Site shell errors (navigation, deployment, search)
    #[error("Site error: {0}")]
    Site(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors
    #[error("Error: {0}")]
    Generic(String),
}

impl TrellisError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new plugin error
    pub fn plugin<S: Into<String>>(msg: S) -> Self {
        Self::Plugin(msg.into())
    }

    /// Create a new event bus error
    pub fn event_bus<S: Into<String>>(msg: S) -> Self {
        Self::EventBus(msg.into())
    }

    /// Create a new editor error
    pub fn editor<S: Into<String>>(msg: S) -> Self {
        Self::Editor(msg.into())
    }

    /// Create a new chatbot error
    pub fn chatbot<S: Into<String>>(msg: S) -> Self {
        Self::Chatbot(msg.into())
    }

    /// Create a new server error
    pub fn server<S: Into<String>>(msg: S) -> Self {
        Self::Server(msg.into())
    }

    /// Create a new site error
    pub fn site<S: Into<String>>(msg: S) -> Self {
        Self::Site(msg.into())
    }

    /// Create a generic error
    pub fn generic<S: Into<String>>(msg: S) -> Self {
        Self::Generic(msg.into())
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        match self {
            TrellisError::Config(_) => false,
            TrellisError::Plugin(_) => true,
            TrellisError::EventBus(_) => true,
            TrellisError::Editor(_) => true,
            TrellisError::Chatbot(_) => true,
            TrellisError::Server(_) => true,
            TrellisError::Site(_) => true,
            TrellisError::Io(_) => true,
            TrellisError::Json(_) => false,
            TrellisError::Generic(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TrellisError::Config(_) => ErrorSeverity::High,
            TrellisError::Plugin(_) => ErrorSeverity::Medium,
            TrellisError::EventBus(_) => ErrorSeverity::Medium,
            TrellisError::Editor(_) => ErrorSeverity::Low,
            TrellisError::Chatbot(_) => ErrorSeverity::Medium,
            TrellisError::Server(_) => ErrorSeverity::High,
            TrellisError::Site(_) => ErrorSeverity::Medium,
            TrellisError::Io(_) => ErrorSeverity::Medium,
            TrellisError::Json(_) => ErrorSeverity::Low,
            TrellisError::Generic(_) => ErrorSeverity::Low,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "LOW"),
            ErrorSeverity::Medium => write!(f, "MEDIUM"),
            ErrorSeverity::High => write!(f, "HIGH"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
