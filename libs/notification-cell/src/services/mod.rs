pub mod dispatch;
pub mod webhook;

pub use dispatch::{notify_best_effort, Notifier, TracingNotifier};
pub use webhook::WebhookNotifier;
