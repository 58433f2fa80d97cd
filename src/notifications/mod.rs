use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

/// Notification payload handed to the external sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub owner_id: String,
    pub title: String,
    pub message: String,
    pub scheduled_for: DateTime<Utc>,
}

/// Fire-and-forget notification sink. Delivery failures are the sink's
/// problem; callers never block or fail on it.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: NewNotification);
}

/// Default sink: writes notifications to the log.
#[derive(Default)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn deliver(&self, notification: NewNotification) {
        info!(
            "Notification for {}: {} - {}",
            notification.owner_id, notification.title, notification.message
        );
    }
}
