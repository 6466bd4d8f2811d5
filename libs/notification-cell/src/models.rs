use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    AppointmentCancelled,
    AppointmentRescheduled,
}

impl fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationEvent::AppointmentCancelled => write!(f, "appointment_cancelled"),
            NotificationEvent::AppointmentRescheduled => write!(f, "appointment_rescheduled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub event_type: NotificationEvent,
}

impl Notification {
    pub fn new(user_id: i64, title: impl Into<String>, body: impl Into<String>, event_type: NotificationEvent) -> Self {
        Self {
            user_id,
            title: title.into(),
            body: body.into(),
            event_type,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("Notification timed out after {0} seconds")]
    Timeout(u64),

    #[error("Notification channel misconfigured: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for NotificationError {
    fn from(err: reqwest::Error) -> Self {
        NotificationError::Delivery(err.to_string())
    }
}
