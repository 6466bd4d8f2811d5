use std::sync::Arc;
use std::time::Duration;

use notification_cell::Notifier;
use shared_config::AppConfig;
use shared_database::SchedulingStore;
use shared_models::Clock;

/// Collaborators shared by every handler and background task.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn SchedulingStore>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn SchedulingStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            notifier,
            clock,
        }
    }

    pub fn notification_timeout(&self) -> Duration {
        Duration::from_secs(self.config.notification_timeout_seconds)
    }
}
