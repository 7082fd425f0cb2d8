#[cfg(test)]
mod tests {
    use crate::error::{Result, TrellisError};
    use crate::event::{EventBus, InMemoryEventBus, SystemEvent, SystemEventHandler};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use uuid::Uuid;

    struct RecordingHandler {
        seen: Mutex<Vec<String>>,
    }

    impl RecordingHandler {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SystemEventHandler for RecordingHandler {
        async fn handle_system_event(&self, event: &SystemEvent) -> Result<()> {
            self.seen.lock().unwrap().push(event.event_type().to_string());
            Ok(())
        }

        fn handler_name(&self) -> &str {
            "recording-handler"
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl SystemEventHandler for FailingHandler {
        async fn handle_system_event(&self, _event: &SystemEvent) -> Result<()> {
            Err(TrellisError::generic("handler exploded"))
        }
    }

    #[test]
    fn test_event_creation_helpers() {
        let id = Uuid::new_v4();
        let started = SystemEvent::deployment_started(id);
        assert_eq!(started.event_type(), "deployment_started");
        assert!(started.is_deployment_event());
        assert!(!started.is_plugin_event());

        let done = SystemEvent::deployment_succeeded(id, Duration::from_millis(1500));
        assert_eq!(done.metadata().get("duration_ms"), Some(&"1500".to_string()));
        assert!(done.description().contains(&id.to_string()));

        let loaded = SystemEvent::plugin_loaded("server".to_string(), "1.0.0".to_string());
        assert!(loaded.is_plugin_event());
        assert_eq!(loaded.description(), "Plugin server v1.0.0 loaded");
    }

    #[test]
    fn test_event_serialization() {
        let event = SystemEvent::chat_fallback("status 401".to_string());
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("ChatFallback"));
        assert!(json.contains("status 401"));

        let back: SystemEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event_type(), "chat_fallback");
    }

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers_in_order() {
        let bus = InMemoryEventBus::new();
        let first = Arc::new(RecordingHandler::new());
        let second = Arc::new(RecordingHandler::new());

        bus.subscribe_system_events(first.clone()).await.unwrap();
        bus.subscribe_system_events(second.clone()).await.unwrap();
        assert_eq!(bus.subscription_count().await, 2);

        bus.publish_system_event(SystemEvent::navigation_saved(3))
            .await
            .unwrap();
        bus.publish_system_event(SystemEvent::server_started("127.0.0.1:3000".to_string()))
            .await
            .unwrap();

        assert_eq!(first.seen(), vec!["navigation_saved", "server_started"]);
        assert_eq!(second.seen(), first.seen());
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_block_others() {
        let bus = InMemoryEventBus::new();
        let recorder = Arc::new(RecordingHandler::new());

        bus.subscribe_system_events(Arc::new(FailingHandler))
            .await
            .unwrap();
        bus.subscribe_system_events(recorder.clone()).await.unwrap();

        let result = bus
            .publish_system_event(SystemEvent::navigation_saved(0))
            .await;
        assert!(result.is_ok());
        assert_eq!(recorder.seen().len(), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe() {
        let bus = InMemoryEventBus::new();
        let recorder = Arc::new(RecordingHandler::new());
        let id = bus.subscribe_system_events(recorder.clone()).await.unwrap();

        bus.unsubscribe(id).await.unwrap();
        assert_eq!(bus.subscription_count().await, 0);

        bus.publish_system_event(SystemEvent::navigation_saved(1))
            .await
            .unwrap();
        assert!(recorder.seen().is_empty());

        // Removing twice is tolerated
        assert!(bus.unsubscribe(id).await.is_ok());
    }
}
