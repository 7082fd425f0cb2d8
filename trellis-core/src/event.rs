//! Event system for decoupled communication between components

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;

/// Event bus for publishing and subscribing to system events
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish a system event to all subscribers
    async fn publish_system_event(&self, event: SystemEvent) -> Result<()>;

    /// Subscribe to system events
    async fn subscribe_system_events(
        &self,
        handler: Arc<dyn SystemEventHandler>,
    ) -> Result<SubscriptionId>;

    /// Unsubscribe from events
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()>;

    /// Get the number of active subscriptions
    async fn subscription_count(&self) -> usize;
}

/// Handler for system events
#[async_trait]
pub trait SystemEventHandler: Send + Sync {
    /// Handle a system event
    async fn handle_system_event(&self, event: &SystemEvent) -> Result<()>;

    /// Get handler name for debugging
    fn handler_name(&self) -> &str {
        "UnnamedSystemEventHandler"
    }
}

/// Unique identifier for event subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// System events that can occur during operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SystemEvent {
    /// HTTP server is listening
    ServerStarted {
        address: String,
        timestamp: SystemTime,
    },
    /// A handler was added to the server's registry
    HandlerRegistered {
        handler_type: String,
        route: String,
        timestamp: SystemTime,
    },
    /// Plugin was loaded
    PluginLoaded {
        plugin_name: String,
        version: String,
        timestamp: SystemTime,
    },
    /// Plugin was unloaded
    PluginUnloaded {
        plugin_name: String,
        timestamp: SystemTime,
    },
    /// Simulated deployment began
    DeploymentStarted {
        deployment_id: Uuid,
        timestamp: SystemTime,
    },
    /// Simulated deployment finished
    DeploymentSucceeded {
        deployment_id: Uuid,
        duration: Duration,
        timestamp: SystemTime,
    },
    /// Navigation menu was persisted
    NavigationSaved {
        item_count: usize,
        timestamp: SystemTime,
    },
    /// The chatbot endpoint answered from the mock responder after a provider failure
    ChatFallback {
        reason: String,
        timestamp: SystemTime,
    },
}

impl SystemEvent {
    pub fn server_started(address: String) -> Self {
        Self::ServerStarted {
            address,
            timestamp: SystemTime::now(),
        }
    }

    pub fn handler_registered(handler_type: String, route: String) -> Self {
        Self::HandlerRegistered {
            handler_type,
            route,
            timestamp: SystemTime::now(),
        }
    }

    pub fn plugin_loaded(plugin_name: String, version: String) -> Self {
        Self::PluginLoaded {
            plugin_name,
            version,
            timestamp: SystemTime::now(),
        }
    }

    pub fn plugin_unloaded(plugin_name: String) -> Self {
        Self::PluginUnloaded {
            plugin_name,
            timestamp: SystemTime::now(),
        }
    }

    pub fn deployment_started(deployment_id: Uuid) -> Self {
        Self::DeploymentStarted {
            deployment_id,
            timestamp: SystemTime::now(),
        }
    }

    pub fn deployment_succeeded(deployment_id: Uuid, duration: Duration) -> Self {
        Self::DeploymentSucceeded {
            deployment_id,
            duration,
            timestamp: SystemTime::now(),
        }
    }

    pub fn navigation_saved(item_count: usize) -> Self {
        Self::NavigationSaved {
            item_count,
            timestamp: SystemTime::now(),
        }
    }

    pub fn chat_fallback(reason: String) -> Self {
        Self::ChatFallback {
            reason,
            timestamp: SystemTime::now(),
        }
    }

    /// Get the event type identifier
    pub fn event_type(&self) -> &str {
        match self {
            SystemEvent::ServerStarted { .. } => "server_started",
            SystemEvent::HandlerRegistered { .. } => "handler_registered",
            SystemEvent::PluginLoaded { .. } => "plugin_loaded",
            SystemEvent::PluginUnloaded { .. } => "plugin_unloaded",
            SystemEvent::DeploymentStarted { .. } => "deployment_started",
            SystemEvent::DeploymentSucceeded { .. } => "deployment_succeeded",
            SystemEvent::NavigationSaved { .. } => "navigation_saved",
            SystemEvent::ChatFallback { .. } => "chat_fallback",
        }
    }

    /// Get the event timestamp
    pub fn timestamp(&self) -> SystemTime {
        match self {
            SystemEvent::ServerStarted { timestamp, .. }
            | SystemEvent::HandlerRegistered { timestamp, .. }
            | SystemEvent::PluginLoaded { timestamp, .. }
            | SystemEvent::PluginUnloaded { timestamp, .. }
            | SystemEvent::DeploymentStarted { timestamp, .. }
            | SystemEvent::DeploymentSucceeded { timestamp, .. }
            | SystemEvent::NavigationSaved { timestamp, .. }
            | SystemEvent::ChatFallback { timestamp, .. } => *timestamp,
        }
    }

    /// Get event metadata
    pub fn metadata(&self) -> HashMap<String, String> {
        let mut metadata = HashMap::new();

        match self {
            SystemEvent::ServerStarted { address, .. } => {
                metadata.insert("address".to_string(), address.clone());
            }
            SystemEvent::HandlerRegistered {
                handler_type,
                route,
                ..
            } => {
                metadata.insert("handler_type".to_string(), handler_type.clone());
                metadata.insert("route".to_string(), route.clone());
            }
            SystemEvent::PluginLoaded {
                plugin_name,
                version,
                ..
            } => {
                metadata.insert("plugin_name".to_string(), plugin_name.clone());
                metadata.insert("version".to_string(), version.clone());
            }
            SystemEvent::PluginUnloaded { plugin_name, .. } => {
                metadata.insert("plugin_name".to_string(), plugin_name.clone());
            }
            SystemEvent::DeploymentStarted { deployment_id, .. } => {
                metadata.insert("deployment_id".to_string(), deployment_id.to_string());
            }
            SystemEvent::DeploymentSucceeded {
                deployment_id,
                duration,
                ..
            } => {
                metadata.insert("deployment_id".to_string(), deployment_id.to_string());
                metadata.insert("duration_ms".to_string(), duration.as_millis().to_string());
            }
            SystemEvent::NavigationSaved { item_count, .. } => {
                metadata.insert("item_count".to_string(), item_count.to_string());
            }
            SystemEvent::ChatFallback { reason, .. } => {
                metadata.insert("reason".to_string(), reason.clone());
            }
        }

        metadata
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            SystemEvent::ServerStarted { address, .. } => {
                format!("Server listening on {}", address)
            }
            SystemEvent::HandlerRegistered {
                handler_type,
                route,
                ..
            } => format!("Registered {} handler {}", handler_type, route),
            SystemEvent::PluginLoaded {
                plugin_name,
                version,
                ..
            } => format!("Plugin {} v{} loaded", plugin_name, version),
            SystemEvent::PluginUnloaded { plugin_name, .. } => {
                format!("Plugin {} unloaded", plugin_name)
            }
            SystemEvent::DeploymentStarted { deployment_id, .. } => {
                format!("Deployment {} started", deployment_id)
            }
            SystemEvent::DeploymentSucceeded {
                deployment_id,
                duration,
                ..
            } => format!("Deployment {} succeeded in {:?}", deployment_id, duration),
            SystemEvent::NavigationSaved { item_count, .. } => {
                format!("Saved {} navigation items", item_count)
            }
            SystemEvent::ChatFallback { reason, .. } => {
                format!("Chat provider failed, used fallback: {}", reason)
            }
        }
    }

    /// Check if this is a deployment event
    pub fn is_deployment_event(&self) -> bool {
        matches!(
            self,
            SystemEvent::DeploymentStarted { .. } | SystemEvent::DeploymentSucceeded { .. }
        )
    }

    /// Check if this is a plugin event
    pub fn is_plugin_event(&self) -> bool {
        matches!(
            self,
            SystemEvent::PluginLoaded { .. } | SystemEvent::PluginUnloaded { .. }
        )
    }
}

/// In-memory implementation of the event bus
pub struct InMemoryEventBus {
    subscriptions: RwLock<Vec<(SubscriptionId, Arc<dyn SystemEventHandler>)>>,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish_system_event(&self, event: SystemEvent) -> Result<()> {
        tracing::debug!("Publishing event: {}", event.event_type());

        // Snapshot so handlers may subscribe or publish without deadlocking
        let handlers: Vec<Arc<dyn SystemEventHandler>> = {
            let subscriptions = self.subscriptions.read().await;
            subscriptions.iter().map(|(_, h)| h.clone()).collect()
        };

        if handlers.is_empty() {
            tracing::trace!("No subscribers for event type: {}", event.event_type());
            return Ok(());
        }

        let mut handlers_called = 0;
        for handler in handlers {
            if let Err(e) = handler.handle_system_event(&event).await {
                tracing::error!(
                    "Handler {} failed to process event {}: {}",
                    handler.handler_name(),
                    event.event_type(),
                    e
                );
            } else {
                handlers_called += 1;
            }
        }

        tracing::debug!(
            "Routed event {} to {} handlers",
            event.event_type(),
            handlers_called
        );

        Ok(())
    }

    async fn subscribe_system_events(
        &self,
        handler: Arc<dyn SystemEventHandler>,
    ) -> Result<SubscriptionId> {
        let id = SubscriptionId::new();
        tracing::debug!(
            "Created subscription {:?} for handler {}",
            id,
            handler.handler_name()
        );
        self.subscriptions.write().await.push((id, handler));
        Ok(id)
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        let mut subscriptions = self.subscriptions.write().await;
        let before = subscriptions.len();
        subscriptions.retain(|(sub_id, _)| *sub_id != id);

        if subscriptions.len() < before {
            tracing::debug!("Removed subscription: {:?}", id);
        } else {
            tracing::warn!("Attempted to remove non-existent subscription: {:?}", id);
        }

        Ok(())
    }

    async fn subscription_count(&self) -> usize {
        self.subscriptions.read().await.len()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}
