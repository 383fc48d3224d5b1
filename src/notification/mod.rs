//! Local-notification side channel for finished countdowns

pub mod request;
pub mod scheduler;
pub mod service;

pub use request::{NotificationContent, NotificationRequest};
pub use scheduler::NotificationScheduler;
pub use service::{AuthorizationStatus, NotificationService};
