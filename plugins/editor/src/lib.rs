//! Editor plugin for Trellis
//!
//! A page is edited either as an ordered list of typed blocks, each with its
//! own sub-editor widget, or as raw HTML in advanced mode. Switching to
//! advanced mode with an empty buffer materializes the blocks into HTML.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use trellis_chatbot::ChatTransport;
use trellis_core::{Plugin, PluginContext, PluginStatus, Result, TrellisError};

pub mod blocks;
pub mod editor_state;
pub mod materialize;
pub mod renderer;
pub mod session;



pub use blocks::{
    render_chat_panel, BlockAction, BlockWidget, EditorInput, MountedBlock, SelectedFile,
    WidgetContext,
};
pub use editor_state::{page_content, EditorMode, EditorSnapshot, PageEditor, SelectorState, EMPTY_NOTICE};
pub use materialize::materialize;
pub use renderer::render_editor;
pub use session::{
    title_from_slug, EditorCommand, PageSession, PageView, PublishedPage, SessionManager,
};

/// Editor-specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("Cannot {action} in {mode} mode while the block selector is {selector}")]
    InvalidTransition {
        action: &'static str,
        mode: EditorMode,
        selector: SelectorState,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<EditorError> for TrellisError {
    fn from(err: EditorError) -> Self {
        TrellisError::Editor(err.to_string())
    }
}

/// Plugin owning the live editing sessions
pub struct EditorPlugin {
    name: String,
    version: String,
    status: PluginStatus,
    sessions: Arc<SessionManager>,
}

impl EditorPlugin {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self {
            name: "editor".to_string(),
            version: "0.1.0".to_string(),
            status: PluginStatus::Loading,
            sessions,
        }
    }

    /// Build a plugin with a fresh session manager sending chat through `transport`
    pub fn with_transport(transport: Arc<dyn ChatTransport>) -> Self {
        Self::new(Arc::new(SessionManager::new(transport)))
    }

    pub fn sessions(&self) -> Arc<SessionManager> {
        self.sessions.clone()
    }
}

#[async_trait]
impl Plugin for EditorPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    async fn initialize(&mut self, _context: &PluginContext) -> Result<()> {
        tracing::info!("Initializing editor plugin");
        self.status = PluginStatus::Active;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.status = PluginStatus::Shutting;

        let open = self.sessions.slugs().await;
        if !open.is_empty() {
            tracing::info!("Closing {} editor session(s): {}", open.len(), open.join(", "));
        }
        for slug in open {
            self.sessions.close(&slug).await;
        }

        self.status = PluginStatus::Stopped;
        Ok(())
    }

    fn status(&self) -> PluginStatus {
        self.status.clone()
    }

    fn provided_services(&self) -> Vec<&str> {
        vec!["editor_sessions"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_chatbot::{ChatbotEndpoint, EndpointTransport};
    use trellis_core::{Config, EventBus, InMemoryEventBus};

    #[tokio::test]
    async fn test_plugin_lifecycle_closes_sessions() {
        let transport = Arc::new(EndpointTransport::new(Arc::new(ChatbotEndpoint::mock_only())));
        let mut plugin = EditorPlugin::with_transport(transport);
        let bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new());
        let context = PluginContext::new(bus, Arc::new(Config::new()));

        plugin.initialize(&context).await.unwrap();
        assert_eq!(plugin.status(), PluginStatus::Active);

        plugin.sessions().view("home").await;
        assert_eq!(plugin.sessions().session_count().await, 1);

        plugin.shutdown().await.unwrap();
        assert_eq!(plugin.status(), PluginStatus::Stopped);
        assert_eq!(plugin.sessions().session_count().await, 0);
    }

    #[test]
    fn test_plugin_shares_session_manager() {
        let transport = Arc::new(EndpointTransport::new(Arc::new(ChatbotEndpoint::mock_only())));
        let sessions = Arc::new(SessionManager::new(transport));
        let plugin = EditorPlugin::new(sessions.clone());

        tokio_test::block_on(sessions.view("about"));
        assert_eq!(tokio_test::block_on(plugin.sessions().session_count()), 1);
        assert_eq!(plugin.provided_services(), vec!["editor_sessions"]);
    }

    #[test]
    fn test_transition_error_message() {
        let err = EditorError::InvalidTransition {
            action: "request_add_block",
            mode: EditorMode::Advanced,
            selector: SelectorState::Closed,
        };
        let core: TrellisError = err.into();
        assert!(core
            .to_string()
            .contains("Cannot request_add_block in advanced mode"));
    }
}
