//! Simulated site deployment

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use trellis_core::{EventBus, SystemEvent};
use uuid::Uuid;

use crate::SiteError;

pub const STARTED_LOG: &str = "Deployment started...";
pub const SUCCESS_LOG: &str = "Deployment successful!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum DeploymentStatus {
    Idle,
    Deploying,
    Success,
    Error(String),
}

/// Outcome of one deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub id: Uuid,
    pub status: DeploymentStatus,
    pub logs: Vec<String>,
    pub started_at: String,
    pub duration_ms: u64,
}

pub struct Deployer {
    latency: Duration,
    status: Arc<Mutex<DeploymentStatus>>,
    last_report: Mutex<Option<DeploymentReport>>,
    event_bus: Option<Arc<dyn EventBus>>,
}

impl Deployer {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            status: Arc::new(Mutex::new(DeploymentStatus::Idle)),
            last_report: Mutex::new(None),
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: Arc<dyn EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn status(&self) -> DeploymentStatus {
        lock(&self.status).clone()
    }

    pub fn last_report(&self) -> Option<DeploymentReport> {
        lock(&self.last_report).clone()
    }

    /// Run one deployment to completion.
    ///
    /// Only one deployment runs at a time; a second call while one is in
    /// flight fails with [`SiteError::DeploymentInProgress`].
    pub async fn deploy(&self) -> Result<DeploymentReport, SiteError> {
        {
            let mut status = lock(&self.status);
            if *status == DeploymentStatus::Deploying {
                return Err(SiteError::DeploymentInProgress);
            }
            *status = DeploymentStatus::Deploying;
        }
        let mut guard = InFlight {
            status: self.status.clone(),
            finished: false,
        };

        let id = Uuid::new_v4();
        let started_at = chrono::Utc::now().to_rfc3339();
        let start = Instant::now();
        let mut logs = vec![STARTED_LOG.to_string()];

        tracing::info!("{} ({})", STARTED_LOG, id);
        self.publish(SystemEvent::deployment_started(id)).await;

        tokio::time::sleep(self.latency).await;

        let elapsed = start.elapsed();
        logs.push(SUCCESS_LOG.to_string());
        tracing::info!("{} ({} in {:?})", SUCCESS_LOG, id, elapsed);

        *lock(&self.status) = DeploymentStatus::Success;
        guard.finished = true;

        self.publish(SystemEvent::deployment_succeeded(id, elapsed))
            .await;

        let report = DeploymentReport {
            id,
            status: DeploymentStatus::Success,
            logs,
            started_at,
            duration_ms: elapsed.as_millis() as u64,
        };
        *lock(&self.last_report) = Some(report.clone());
        Ok(report)
    }

    async fn publish(&self, event: SystemEvent) {
        if let Some(bus) = &self.event_bus {
            if let Err(e) = bus.publish_system_event(event).await {
                tracing::warn!("Failed to publish deployment event: {}", e);
            }
        }
    }
}

/// Marks an abandoned deployment as failed
struct InFlight {
    status: Arc<Mutex<DeploymentStatus>>,
    finished: bool,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("Deployment cancelled before completion");
            *lock(&self.status) = DeploymentStatus::Error("Deployment cancelled".to_string());
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{InMemoryEventBus, SystemEventHandler};

    struct Recorder(Mutex<Vec<String>>);

    #[async_trait::async_trait]
    impl SystemEventHandler for Recorder {
        async fn handle_system_event(&self, event: &SystemEvent) -> trellis_core::Result<()> {
            self.0.lock().unwrap().push(event.event_type().to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_deploy_logs_and_status() {
        let deployer = Deployer::new(Duration::from_millis(10));
        assert_eq!(deployer.status(), DeploymentStatus::Idle);

        let report = deployer.deploy().await.unwrap();
        assert_eq!(report.status, DeploymentStatus::Success);
        assert_eq!(report.logs, vec![STARTED_LOG, SUCCESS_LOG]);
        assert!(report.duration_ms >= 10);
        assert_eq!(deployer.status(), DeploymentStatus::Success);
        assert_eq!(deployer.last_report(), Some(report));
    }

    #[tokio::test]
    async fn test_concurrent_deploy_rejected() {
        let deployer = Deployer::new(Duration::from_millis(50));
        let (first, second) = tokio::join!(deployer.deploy(), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            deployer.deploy().await
        });

        assert!(first.is_ok());
        assert!(matches!(second, Err(SiteError::DeploymentInProgress)));

        // Done deploying, so another run is allowed
        assert!(deployer.deploy().await.is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_deploy_marks_error() {
        let deployer = Deployer::new(Duration::from_secs(60));
        let cancelled =
            tokio::time::timeout(Duration::from_millis(10), deployer.deploy()).await;
        assert!(cancelled.is_err());
        assert_eq!(
            deployer.status(),
            DeploymentStatus::Error("Deployment cancelled".to_string())
        );
    }

    #[tokio::test]
    async fn test_deploy_publishes_events() {
        let bus = Arc::new(InMemoryEventBus::new());
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        bus.subscribe_system_events(recorder.clone()).await.unwrap();

        let deployer = Deployer::new(Duration::from_millis(1)).with_event_bus(bus);
        deployer.deploy().await.unwrap();

        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec!["deployment_started", "deployment_succeeded"]
        );
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_value(DeploymentStatus::Idle).unwrap(),
            serde_json::json!({"state": "idle"})
        );
        assert_eq!(
            serde_json::to_value(DeploymentStatus::Error("boom".to_string())).unwrap(),
            serde_json::json!({"state": "error", "message": "boom"})
        );
    }
}
