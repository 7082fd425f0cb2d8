//! Site navigation and where it is kept

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use trellis_core::{Result, TrellisError};

/// Storage key of the saved navigation
pub const NAVIGATION_KEY: &str = "siteNavigation";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationItem {
    pub title: String,
    pub link: String,
}

impl NavigationItem {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }
}

/// Persistent home of the site navigation
#[async_trait]
pub trait NavigationStore: Send + Sync {
    /// Saved navigation, `None` when nothing has been saved yet
    async fn load(&self) -> Result<Option<Vec<NavigationItem>>>;

    /// Replace the saved navigation
    async fn save(&self, items: &[NavigationItem]) -> Result<()>;
}

/// Navigation kept as JSON at `<data_dir>/siteNavigation.json`
pub struct FileNavigationStore {
    path: PathBuf,
}

impl FileNavigationStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(format!("{}.json", NAVIGATION_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl NavigationStore for FileNavigationStore {
    async fn load(&self) -> Result<Option<Vec<NavigationItem>>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let items = serde_json::from_str(&content).map_err(|e| {
            TrellisError::site(format!(
                "Failed to parse navigation at {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(Some(items))
    }

    async fn save(&self, items: &[NavigationItem]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(items)?;
        tokio::fs::write(&self.path, content).await.map_err(|e| {
            TrellisError::site(format!(
                "Failed to write navigation to {}: {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!("Saved {} navigation items to {}", items.len(), self.path.display());
        Ok(())
    }
}

/// In-memory store holding the raw serialized form
#[derive(Default)]
pub struct MemoryNavigationStore {
    raw: RwLock<Option<String>>,
}

impl MemoryNavigationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with raw saved data, which need not be valid JSON
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: RwLock::new(Some(raw.into())),
        }
    }
}

#[async_trait]
impl NavigationStore for MemoryNavigationStore {
    async fn load(&self) -> Result<Option<Vec<NavigationItem>>> {
        match self.raw.read().await.as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, items: &[NavigationItem]) -> Result<()> {
        let raw = serde_json::to_string(items)?;
        *self.raw.write().await = Some(raw);
        Ok(())
    }
}

/// Navigation for a layout: explicit items win, otherwise the saved ones.
///
/// Saved data that cannot be read is logged and ignored.
pub async fn resolve_navigation(
    explicit: &[NavigationItem],
    store: &dyn NavigationStore,
) -> Vec<NavigationItem> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }

    match store.load().await {
        Ok(Some(items)) => items,
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!("Error loading saved navigation: {}", e);
            Vec::new()
        }
    }
}
