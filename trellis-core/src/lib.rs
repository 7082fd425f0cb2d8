//! Trellis Core - foundations for the Trellis site builder
//!
//! This crate provides the block model, configuration, event system and plugin
//! architecture shared by the editor, chatbot, site and server plugins.

pub mod block;
pub mod config;
pub mod error;
pub mod event;
pub mod plugin;

#[cfg(test)]
mod event_test;

#[cfg(test)]
mod plugin_test;

// Re-export commonly used types
pub use block::{
    default_payload, generate_id, Block, BlockId, BlockKind, BlockType, Page, VideoProvider,
};
pub use config::{ChatbotConfig, Config, ServerConfig, SiteConfig, ValidationResult};
pub use error::{ErrorSeverity, Result, TrellisError};
pub use event::{EventBus, InMemoryEventBus, SubscriptionId, SystemEvent, SystemEventHandler};
pub use plugin::{Plugin, PluginContext, PluginInfo, PluginRegistry, PluginStatus};

use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// Core engine that orchestrates all plugins and system components
pub struct CoreEngine {
    event_bus: Arc<dyn EventBus>,
    plugin_registry: PluginRegistry,
    config: Arc<Config>,
    shutdown_signal: Option<tokio::sync::oneshot::Sender<()>>,
}

impl CoreEngine {
    /// Create a new CoreEngine instance
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            event_bus: Arc::new(InMemoryEventBus::new()),
            plugin_registry: PluginRegistry::new(),
            config: Arc::new(config),
            shutdown_signal: None,
        })
    }

    /// Register a plugin with the core engine
    pub async fn register_plugin(
        &mut self,
        plugin: Box<dyn Plugin>,
        context: &PluginContext,
    ) -> Result<()> {
        self.plugin_registry.register_plugin(plugin, context).await
    }

    /// Get the plugin context for external plugin registration
    pub fn create_plugin_context(&self) -> PluginContext {
        PluginContext::new(self.event_bus.clone(), self.config.clone())
    }

    /// Run until Ctrl+C, SIGTERM or a programmatic shutdown request
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!("Starting Trellis Core Engine");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        self.shutdown_signal = Some(shutdown_tx);

        let shutdown_signal = async {
            let ctrl_c = async {
                if let Err(e) = signal::ctrl_c().await {
                    tracing::error!("Failed to listen for Ctrl+C: {}", e);
                    std::future::pending::<()>().await;
                }
            };

            #[cfg(unix)]
            let terminate = async {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sig) => {
                        sig.recv().await;
                    }
                    Err(e) => {
                        tracing::error!("Failed to install SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => {
                    tracing::info!("Received Ctrl+C signal");
                },
                _ = terminate => {
                    tracing::info!("Received terminate signal");
                },
            }
        };

        tokio::select! {
            _ = shutdown_signal => {
                tracing::info!("Shutdown signal received");
            }
            _ = shutdown_rx => {
                tracing::info!("Shutdown requested programmatically");
            }
        }

        self.shutdown().await?;

        tracing::info!("Trellis Core Engine stopped");
        Ok(())
    }

    /// Request shutdown of a running engine
    pub fn request_shutdown(&mut self) {
        if let Some(sender) = self.shutdown_signal.take() {
            if sender.send(()).is_err() {
                tracing::warn!("Failed to send shutdown signal (receiver may have been dropped)");
            }
        }
    }

    /// Shutdown all plugins, giving up after 30 seconds
    pub async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Shutting down Trellis Core Engine");

        let shutdown_timeout = Duration::from_secs(30);
        let event_bus = self.event_bus.clone();

        match tokio::time::timeout(shutdown_timeout, self.plugin_registry.shutdown(&event_bus))
            .await
        {
            Ok(Err(e)) => tracing::error!("Plugin registry shutdown failed: {}", e),
            Ok(Ok(())) => {}
            Err(_) => tracing::error!(
                "Plugin registry shutdown timed out after {:?}",
                shutdown_timeout
            ),
        }

        tracing::info!("Core Engine shutdown complete");
        Ok(())
    }

    pub fn event_bus(&self) -> Arc<dyn EventBus> {
        self.event_bus.clone()
    }

    pub fn plugin_registry(&self) -> &PluginRegistry {
        &self.plugin_registry
    }

    pub fn config(&self) -> Arc<Config> {
        self.config.clone()
    }

    /// Server address if the server plugin is active
    pub fn get_server_address(&self) -> Option<String> {
        let info = self.plugin_registry.get_plugin_info("server")?;
        if info.status == PluginStatus::Active {
            Some(format!(
                "{}:{}",
                self.config.server.hostname, self.config.server.port
            ))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_rejects_invalid_config() {
        let mut config = Config::new();
        config.server.port = 0;
        assert!(CoreEngine::new(config).is_err());
    }

    #[test]
    fn test_request_shutdown_before_run_is_harmless() {
        let mut engine = CoreEngine::new(Config::new()).unwrap();
        engine.request_shutdown();
        tokio_test::block_on(engine.shutdown()).unwrap();
    }

    #[tokio::test]
    async fn test_engine_shutdown_without_plugins() {
        let mut engine = CoreEngine::new(Config::new()).unwrap();
        assert!(engine.plugin_registry().list_plugins().is_empty());
        assert!(engine.get_server_address().is_none());
        engine.shutdown().await.unwrap();
    }
}
