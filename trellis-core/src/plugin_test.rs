#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::error::Result;
    use crate::event::{EventBus, InMemoryEventBus};
    use crate::plugin::{Plugin, PluginContext, PluginRegistry, PluginStatus};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct TestPlugin {
        name: String,
        deps: Vec<&'static str>,
        log: Arc<Mutex<Vec<String>>>,
        status: PluginStatus,
    }

    impl TestPlugin {
        fn new(name: &str, deps: Vec<&'static str>, log: Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name: name.to_string(),
                deps,
                log,
                status: PluginStatus::Loading,
            }
        }
    }

    #[async_trait]
    impl Plugin for TestPlugin {
        fn name(&self) -> &str {
            &self.name
        }

        fn version(&self) -> &str {
            "0.1.0"
        }

        fn dependencies(&self) -> Vec<&str> {
            self.deps.clone()
        }

        async fn initialize(&mut self, _context: &PluginContext) -> Result<()> {
            self.log.lock().unwrap().push(format!("init {}", self.name));
            self.status = PluginStatus::Active;
            Ok(())
        }

        async fn shutdown(&mut self) -> Result<()> {
            self.log.lock().unwrap().push(format!("stop {}", self.name));
            self.status = PluginStatus::Stopped;
            Ok(())
        }

        fn status(&self) -> PluginStatus {
            self.status.clone()
        }
    }

    fn context() -> (PluginContext, Arc<dyn EventBus>) {
        let bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new());
        (
            PluginContext::new(bus.clone(), Arc::new(Config::new())),
            bus,
        )
    }

    #[tokio::test]
    async fn test_register_and_shutdown_order() {
        let (ctx, bus) = context();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PluginRegistry::new();

        registry
            .register_plugin(Box::new(TestPlugin::new("site", vec![], log.clone())), &ctx)
            .await
            .unwrap();
        registry
            .register_plugin(
                Box::new(TestPlugin::new("server", vec!["site"], log.clone())),
                &ctx,
            )
            .await
            .unwrap();

        let names: Vec<_> = registry
            .list_plugins()
            .iter()
            .map(|p| p.name.clone())
            .collect();
        assert_eq!(names, vec!["site", "server"]);
        assert_eq!(
            registry.get_plugin_info("server").unwrap().status,
            PluginStatus::Active
        );

        registry.shutdown(&bus).await.unwrap();
        assert!(!registry.is_plugin_loaded("site"));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["init site", "init server", "stop server", "stop site"]
        );
    }

    #[tokio::test]
    async fn test_missing_dependency_rejected() {
        let (ctx, _bus) = context();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PluginRegistry::new();

        let result = registry
            .register_plugin(
                Box::new(TestPlugin::new("server", vec!["site"], log.clone())),
                &ctx,
            )
            .await;

        assert!(result.is_err());
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let (ctx, _bus) = context();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PluginRegistry::new();

        registry
            .register_plugin(Box::new(TestPlugin::new("site", vec![], log.clone())), &ctx)
            .await
            .unwrap();
        let again = registry
            .register_plugin(Box::new(TestPlugin::new("site", vec![], log.clone())), &ctx)
            .await;
        assert!(again.is_err());
    }
}
