use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notification_cell::{
    notify_best_effort, Notification, NotificationError, NotificationEvent, Notifier, WebhookNotifier,
};

fn cancellation() -> Notification {
    Notification::new(
        42,
        "Appointment cancelled",
        "Your appointment on 2025-09-01 at 8:00AM - 8:30AM was cancelled.",
        NotificationEvent::AppointmentCancelled,
    )
}

#[tokio::test]
async fn webhook_posts_notification_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notify"))
        .and(body_partial_json(json!({
            "user_id": 42,
            "event_type": "appointment_cancelled"
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(format!("{}/notify", server.uri())).unwrap();
    notifier.notify(cancellation()).await.unwrap();
}

#[tokio::test]
async fn webhook_gateway_errors_are_delivery_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(server.uri()).unwrap();
    assert_matches!(notifier.notify(cancellation()).await, Err(NotificationError::Delivery(_)));
}

#[test]
fn webhook_rejects_non_http_urls() {
    assert_matches!(
        WebhookNotifier::new("ftp://gateway"),
        Err(NotificationError::Configuration(_))
    );
}

struct SlowNotifier;

#[async_trait]
impl Notifier for SlowNotifier {
    async fn notify(&self, _notification: Notification) -> Result<(), NotificationError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn best_effort_gives_up_after_timeout() {
    let delivered = notify_best_effort(&SlowNotifier, cancellation(), Duration::from_secs(1)).await;
    assert!(!delivered);
}

#[tokio::test]
async fn best_effort_swallows_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(server.uri()).unwrap();
    let delivered = notify_best_effort(&notifier, cancellation(), Duration::from_secs(5)).await;
    assert!(!delivered);
}
