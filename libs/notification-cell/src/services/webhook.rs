use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

use crate::models::{Notification, NotificationError};
use crate::services::dispatch::Notifier;

/// Posts each notification as JSON to a delivery gateway that fans out to
/// push/SMS providers.
#[derive(Debug)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotificationError> {
        let url = url.into();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(NotificationError::Configuration(format!("not an http(s) url: {}", url)));
        }

        Ok(Self {
            client: Client::new(),
            url,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError> {
        debug!("Posting {} notification for user {}", notification.event_type, notification.user_id);

        let response = self.client.post(&self.url).json(&notification).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Notification gateway error ({}): {}", status, error_text);
            return Err(NotificationError::Delivery(format!("gateway returned {}", status)));
        }

        Ok(())
    }
}
