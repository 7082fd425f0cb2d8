//! Site shell plugin for Trellis
//!
//! Everything around the editor that a published site needs: saved
//! navigation, the page layout, SEO metadata, keyword search, the builder
//! dashboard and a deployment simulator.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use trellis_core::{
    EventBus, Plugin, PluginContext, PluginStatus, Result, SiteConfig, SystemEvent, TrellisError,
};

pub mod deployment;
pub mod layout;
pub mod navigation;
pub mod pages;
pub mod search;
pub mod seo;

pub use deployment::{Deployer, DeploymentReport, DeploymentStatus};
pub use layout::{render_layout, render_layout_for_year, PageMeta};
pub use navigation::{
    resolve_navigation, FileNavigationStore, MemoryNavigationStore, NavigationItem,
    NavigationStore, NAVIGATION_KEY,
};
pub use pages::{
    render_chatbot_demo, render_dashboard, render_home, render_public_page, render_search_page,
    DEMO_SUGGESTIONS, HOME_LINKS,
};
pub use search::{builtin_pages, SearchIndex, SearchResult, SearchablePage};
pub use seo::{generate_seo_data, validate_seo_data, SeoData};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SiteError {
    #[error("A deployment is already in progress")]
    DeploymentInProgress,
}

impl From<SiteError> for TrellisError {
    fn from(err: SiteError) -> Self {
        TrellisError::Site(err.to_string())
    }
}

/// Shared site state handed to the HTTP layer
pub struct SiteServices {
    navigation: Arc<dyn NavigationStore>,
    deployer: Arc<Deployer>,
    search: Arc<SearchIndex>,
    event_bus: Arc<dyn EventBus>,
}

impl SiteServices {
    pub fn new(
        navigation: Arc<dyn NavigationStore>,
        deployer: Arc<Deployer>,
        search: Arc<SearchIndex>,
        event_bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            navigation,
            deployer,
            search,
            event_bus,
        }
    }

    /// File-backed navigation under the configured data dir and the built-in search corpus
    pub fn from_config(config: &SiteConfig, event_bus: Arc<dyn EventBus>) -> Self {
        let deployer = Deployer::new(Duration::from_millis(config.deployment_latency_ms))
            .with_event_bus(event_bus.clone());
        Self::new(
            Arc::new(FileNavigationStore::new(&config.data_dir)),
            Arc::new(deployer),
            Arc::new(SearchIndex::default()),
            event_bus,
        )
    }

    pub fn deployer(&self) -> Arc<Deployer> {
        self.deployer.clone()
    }

    pub fn search_index(&self) -> Arc<SearchIndex> {
        self.search.clone()
    }

    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        self.search.search(query)
    }

    /// Saved navigation; unreadable data counts as none
    pub async fn navigation(&self) -> Vec<NavigationItem> {
        resolve_navigation(&[], self.navigation.as_ref()).await
    }

    pub async fn save_navigation(&self, items: &[NavigationItem]) -> Result<()> {
        self.navigation.save(items).await?;

        if let Err(e) = self
            .event_bus
            .publish_system_event(SystemEvent::navigation_saved(items.len()))
            .await
        {
            tracing::warn!("Failed to publish navigation saved event: {}", e);
        }
        Ok(())
    }

    /// Render `body` inside the layout with the saved navigation
    pub async fn render_page(&self, body: &str, meta: &PageMeta) -> String {
        let navigation = self.navigation().await;
        render_layout(body, &navigation, meta)
    }
}

pub struct SitePlugin {
    name: String,
    version: String,
    status: PluginStatus,
    services: Arc<SiteServices>,
}

impl SitePlugin {
    pub fn new(services: Arc<SiteServices>) -> Self {
        Self {
            name: "site".to_string(),
            version: "0.1.0".to_string(),
            status: PluginStatus::Loading,
            services,
        }
    }

    pub fn services(&self) -> Arc<SiteServices> {
        self.services.clone()
    }
}

#[async_trait]
impl Plugin for SitePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    async fn initialize(&mut self, context: &PluginContext) -> Result<()> {
        tracing::info!(
            "Initializing site plugin (data dir {})",
            context.config.site.data_dir.display()
        );

        let navigation = self.services.navigation().await;
        tracing::debug!("Loaded {} saved navigation items", navigation.len());

        self.status = PluginStatus::Active;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        if self.services.deployer.status() == DeploymentStatus::Deploying {
            tracing::warn!("Shutting down with a deployment in progress");
        }
        self.status = PluginStatus::Stopped;
        Ok(())
    }

    fn status(&self) -> PluginStatus {
        self.status.clone()
    }

    fn provided_services(&self) -> Vec<&str> {
        vec!["navigation", "search", "deployment"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{Config, InMemoryEventBus};

    fn services() -> SiteServices {
        SiteServices::new(
            Arc::new(MemoryNavigationStore::new()),
            Arc::new(Deployer::new(Duration::from_millis(1))),
            Arc::new(SearchIndex::default()),
            Arc::new(InMemoryEventBus::new()),
        )
    }

    #[tokio::test]
    async fn test_saved_navigation_shows_in_layout() {
        let services = services();
        services
            .save_navigation(&[NavigationItem::new("Blog", "/blog")])
            .await
            .unwrap();

        let html = services.render_page("<p>Hi</p>", &PageMeta::default()).await;
        assert!(html.contains("<a href=\"/blog\">Blog</a>"));
    }

    #[tokio::test]
    async fn test_plugin_lifecycle() {
        let services = Arc::new(services());
        let mut plugin = SitePlugin::new(services);
        let context = PluginContext::new(
            Arc::new(InMemoryEventBus::new()),
            Arc::new(Config::new()),
        );

        plugin.initialize(&context).await.unwrap();
        assert_eq!(plugin.status(), PluginStatus::Active);
        plugin.shutdown().await.unwrap();
        assert_eq!(plugin.status(), PluginStatus::Stopped);
    }

    #[tokio::test]
    async fn test_from_config_uses_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig {
            data_dir: dir.path().to_path_buf(),
            deployment_latency_ms: 1,
        };
        let services = SiteServices::from_config(&config, Arc::new(InMemoryEventBus::new()));
        services
            .save_navigation(&[NavigationItem::new("Home", "/")])
            .await
            .unwrap();

        assert!(dir.path().join("siteNavigation.json").exists());
        assert_eq!(services.navigation().await.len(), 1);
    }
}
