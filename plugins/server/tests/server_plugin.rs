use std::sync::{Arc, Mutex};
use std::time::Duration;
use trellis_chatbot::{ChatbotEndpoint, EndpointTransport};
use trellis_core::{
    Config, EventBus, InMemoryEventBus, Plugin, PluginContext, PluginStatus, SystemEvent,
    SystemEventHandler,
};
use trellis_editor::SessionManager;
use trellis_server::{AppServices, ServerPlugin};
use trellis_site::{Deployer, MemoryNavigationStore, SearchIndex, SiteServices};

struct StartRecorder(Mutex<Option<String>>);

#[async_trait::async_trait]
impl SystemEventHandler for StartRecorder {
    async fn handle_system_event(&self, event: &SystemEvent) -> trellis_core::Result<()> {
        if let SystemEvent::ServerStarted { address, .. } = event {
            *self.0.lock().unwrap() = Some(address.clone());
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_server_plugin_binds_and_stops() {
    let bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new());
    let recorder = Arc::new(StartRecorder(Mutex::new(None)));
    bus.subscribe_system_events(recorder.clone()).await.unwrap();

    let chatbot = Arc::new(ChatbotEndpoint::mock_only());
    let services = AppServices {
        sessions: Arc::new(SessionManager::new(Arc::new(EndpointTransport::new(
            chatbot.clone(),
        )))),
        chatbot,
        site: Arc::new(SiteServices::new(
            Arc::new(MemoryNavigationStore::new()),
            Arc::new(Deployer::new(Duration::from_millis(1))),
            Arc::new(SearchIndex::default()),
            bus.clone(),
        )),
    };

    let mut config = Config::new();
    config.server.port = 0;
    let context = PluginContext::new(bus, Arc::new(config));

    let mut plugin = ServerPlugin::new(services);
    plugin.initialize(&context).await.unwrap();
    assert_eq!(plugin.status(), PluginStatus::Active);

    let addr = plugin.local_addr().unwrap();
    assert_ne!(addr.port(), 0);
    assert_eq!(*recorder.0.lock().unwrap(), Some(addr.to_string()));

    let registry = plugin.handler_registry().unwrap();
    assert_eq!(registry.list_http_handlers().await.len(), 14);

    plugin.shutdown().await.unwrap();
    assert_eq!(plugin.status(), PluginStatus::Stopped);
    assert!(plugin.local_addr().is_none());
    assert!(registry.list_http_handlers().await.is_empty());
}
