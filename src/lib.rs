//! Restorable countdown - a restartable, pausable countdown timer that
//! survives application suspend and resume.
//!
//! The [`Countdown`] engine computes a target finish time, polls the wall
//! clock while running, and reports the remaining time to an observer.
//! When the host application is about to be suspended, [`Countdown::invalidate`]
//! persists the target to a durable store; [`Countdown::restore`] picks it
//! up again on resume, so the countdown keeps counting "virtually" while
//! the app is away. An optional local-notification side channel fires even
//! when the app never comes back to the foreground in time.
//!
//! ```no_run
//! use std::sync::Arc;
//! use restorable_countdown::{Countdown, CountdownObserver, DurationBreakdown};
//!
//! struct PrintingObserver;
//!
//! impl CountdownObserver for PrintingObserver {
//!     fn on_fired(&self, remaining: DurationBreakdown) {
//!         println!("{}m {}s left", remaining.minutes, remaining.seconds);
//!     }
//!
//!     fn on_finished(&self) {
//!         println!("done");
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let countdown = Countdown::builder().build();
//! let observer = Arc::new(PrintingObserver);
//! countdown.set_observer(&observer);
//! countdown.start();
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod countdown;
pub mod duration;
pub mod lifecycle;
pub mod notification;
pub mod persistence;
pub mod poll;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CountdownConfiguration;
pub use countdown::{Countdown, CountdownBuilder, CountdownObserver, WeakCountdown};
pub use duration::DurationBreakdown;
pub use lifecycle::{
    LifecycleBridge, LifecycleEventSource, LifecycleHub, LifecycleSignal, Subscription,
};
pub use notification::{
    AuthorizationStatus, NotificationContent, NotificationRequest, NotificationScheduler,
    NotificationService,
};
pub use persistence::{FinishTimeStore, JsonFileStore, MemoryStore, StoreError};
pub use poll::{ManualPollScheduler, PollHandle, PollScheduler, TokioPollScheduler};
