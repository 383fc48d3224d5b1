//! Schedulable notification requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload attached to a scheduled notification.
///
/// Opaque to the countdown engine; it is handed to the platform
/// notification service unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
}

impl NotificationContent {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// A schedulable local-notification request keyed by a fresh unique
/// identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub id: String,
    pub content: NotificationContent,
    pub trigger_at: DateTime<Utc>,
}

impl NotificationRequest {
    /// Build a request firing at `trigger_at`; every call generates a new
    /// identifier so requests from different engines never collide
    pub fn build(content: NotificationContent, trigger_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content,
            trigger_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_preserves_content_and_trigger() {
        let content = NotificationContent::new("Timer", "Time is up");
        let trigger_at = Utc::now();
        let request = NotificationRequest::build(content.clone(), trigger_at);

        assert_eq!(request.content, content);
        assert_eq!(request.trigger_at, trigger_at);
    }

    #[test]
    fn build_generates_fresh_identifiers() {
        let content = NotificationContent::new("Timer", "Time is up");
        let trigger_at = Utc::now();
        let first = NotificationRequest::build(content.clone(), trigger_at);
        let second = NotificationRequest::build(content, trigger_at);

        assert_ne!(first.id, second.id);
        assert!(!first.id.is_empty());
    }
}
