use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::models::{Notification, NotificationError};

/// Delivery channel for user-facing notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError>;
}

/// Writes notifications to the log. Used when no delivery channel is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            user_id = notification.user_id,
            event_type = %notification.event_type,
            "Notification: {} - {}",
            notification.title,
            notification.body
        );
        Ok(())
    }
}

/// Sends one notification and swallows any failure. The caller's state change
/// has already committed by the time this runs; a slow or broken channel is
/// cut off after `timeout`.
pub async fn notify_best_effort(notifier: &dyn Notifier, notification: Notification, timeout: Duration) -> bool {
    let user_id = notification.user_id;
    let event_type = notification.event_type;

    match tokio::time::timeout(timeout, notifier.notify(notification)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!(user_id, event_type = %event_type, "Notification failed: {}", e);
            false
        }
        Err(_) => {
            warn!(
                user_id,
                event_type = %event_type,
                "{}",
                NotificationError::Timeout(timeout.as_secs())
            );
            false
        }
    }
}
