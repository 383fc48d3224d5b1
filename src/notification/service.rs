//! Platform notification capability

use async_trait::async_trait;

use super::NotificationRequest;

/// Authorization state reported by the platform notification facility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    Authorized,
    Provisional,
    Denied,
    NotDetermined,
}

impl AuthorizationStatus {
    /// Whether requests may be scheduled under this status.
    ///
    /// Denial is an expected, recoverable condition, not an error; the
    /// countdown itself keeps running either way.
    pub fn allows_scheduling(self) -> bool {
        matches!(self, Self::Authorized | Self::Provisional)
    }
}

/// Local-notification capability the countdown calls through.
///
/// Implemented by the host against its platform notification center. All
/// methods are best-effort; the engine never inspects their outcome.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Current authorization status
    async fn authorization_status(&self) -> AuthorizationStatus;

    /// Add a request to the platform's pending queue
    async fn enqueue(&self, request: NotificationRequest);

    /// Remove every pending request belonging to this countdown
    async fn cancel_all(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_authorized_and_provisional_allow_scheduling() {
        assert!(AuthorizationStatus::Authorized.allows_scheduling());
        assert!(AuthorizationStatus::Provisional.allows_scheduling());
        assert!(!AuthorizationStatus::Denied.allows_scheduling());
        assert!(!AuthorizationStatus::NotDetermined.allows_scheduling());
    }
}
