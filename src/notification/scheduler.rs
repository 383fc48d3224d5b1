//! Authorization-gated notification scheduling

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{NotificationContent, NotificationRequest, NotificationService};

/// Schedules at most one pending notification per countdown.
///
/// Previously pending requests are always removed before a new one is
/// added, so adjusting or restarting a countdown replaces its notification
/// instead of stacking duplicates.
#[derive(Clone)]
pub struct NotificationScheduler {
    service: Arc<dyn NotificationService>,
}

impl NotificationScheduler {
    pub fn new(service: Arc<dyn NotificationService>) -> Self {
        Self { service }
    }

    /// Replace any pending request with one firing at `trigger_at`.
    ///
    /// Silent no-op unless the service reports an authorized or provisional
    /// status.
    pub async fn schedule(&self, content: NotificationContent, trigger_at: DateTime<Utc>) {
        let status = self.service.authorization_status().await;
        if !status.allows_scheduling() {
            debug!(?status, "notification scheduling skipped");
            return;
        }

        self.service.cancel_all().await;
        let request = NotificationRequest::build(content, trigger_at);
        debug!(id = %request.id, %trigger_at, "scheduling countdown notification");
        self.service.enqueue(request).await;
    }

    /// Remove every pending request for this countdown
    pub async fn cancel_all(&self) {
        self.service.cancel_all().await;
    }
}
