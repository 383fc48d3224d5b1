//! Periodic poll scheduling

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

/// Callback invoked on every poll tick
pub type PollCallback = Box<dyn FnMut() + Send + 'static>;

/// Handle to a scheduled repeating poll.
///
/// Cancellation is synchronous: once `cancel` returns, no further callback
/// invocation observes the poll as live.
#[derive(Debug, Clone)]
pub struct PollHandle {
    cancelled: Arc<AtomicBool>,
}

impl PollHandle {
    /// Create a live handle
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancel the poll
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if the poll has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for PollHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Repeating scheduled callback capability injected into the countdown
/// engine.
///
/// `tolerance` is an efficiency hint for schedulers that coalesce wakeups;
/// implementations without such a knob may ignore it.
pub trait PollScheduler: Send + Sync {
    /// Begin invoking `callback` once per `interval` until the returned
    /// handle is cancelled
    fn schedule(
        &self,
        interval: Duration,
        tolerance: Duration,
        callback: PollCallback,
    ) -> PollHandle;
}

/// Poll scheduler backed by a spawned tokio task.
///
/// Requires a running tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPollScheduler;

impl PollScheduler for TokioPollScheduler {
    fn schedule(
        &self,
        interval: Duration,
        _tolerance: Duration,
        mut callback: PollCallback,
    ) -> PollHandle {
        let handle = PollHandle::new();
        let task_handle = handle.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first interval tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if task_handle.is_cancelled() {
                    debug!("poll cancelled, stopping tick task");
                    break;
                }
                callback();
            }
        });

        handle
    }
}

/// Deterministic scheduler for tests and hosts that drive polling
/// themselves.
///
/// Registered callbacks only run when [`ManualPollScheduler::tick`] is
/// called, so time never moves behind the caller's back.
#[derive(Default)]
pub struct ManualPollScheduler {
    polls: Mutex<Vec<(PollHandle, PollCallback)>>,
}

impl ManualPollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke every live callback once, dropping cancelled polls.
    ///
    /// A callback may cancel its own poll during the tick; the poll is
    /// removed before the next tick.
    pub fn tick(&self) {
        let mut polls = self.polls.lock().expect("poll registry lock poisoned");
        polls.retain(|(handle, _)| !handle.is_cancelled());
        for (handle, callback) in polls.iter_mut() {
            if !handle.is_cancelled() {
                callback();
            }
        }
        polls.retain(|(handle, _)| !handle.is_cancelled());
    }

    /// Number of polls still live
    pub fn active_polls(&self) -> usize {
        let mut polls = self.polls.lock().expect("poll registry lock poisoned");
        polls.retain(|(handle, _)| !handle.is_cancelled());
        polls.len()
    }
}

impl PollScheduler for ManualPollScheduler {
    fn schedule(
        &self,
        _interval: Duration,
        _tolerance: Duration,
        callback: PollCallback,
    ) -> PollHandle {
        let handle = PollHandle::new();
        self.polls
            .lock()
            .expect("poll registry lock poisoned")
            .push((handle.clone(), callback));
        handle
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use super::*;

    #[test]
    fn manual_scheduler_ticks_registered_callbacks() {
        let scheduler = ManualPollScheduler::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let handle = scheduler.schedule(
            Duration::from_millis(100),
            Duration::from_millis(50),
            Box::new(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        scheduler.tick();
        scheduler.tick();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.active_polls(), 1);

        handle.cancel();
        scheduler.tick();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.active_polls(), 0);
    }

    #[test]
    fn callback_may_cancel_its_own_poll() {
        let scheduler = ManualPollScheduler::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let slot: Arc<Mutex<Option<PollHandle>>> = Arc::new(Mutex::new(None));
        let slot_clone = Arc::clone(&slot);
        let handle = scheduler.schedule(
            Duration::from_millis(100),
            Duration::from_millis(50),
            Box::new(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                if let Some(handle) = slot_clone.lock().unwrap().as_ref() {
                    handle.cancel();
                }
            }),
        );
        *slot.lock().unwrap() = Some(handle);

        scheduler.tick();
        scheduler.tick();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn tokio_scheduler_fires_repeatedly_until_cancelled() {
        let scheduler = TokioPollScheduler;
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let handle = scheduler.schedule(
            Duration::from_millis(10),
            Duration::from_millis(5),
            Box::new(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        tokio::time::sleep(Duration::from_millis(35)).await;
        handle.cancel();
        let after_cancel = counter.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;

        // Allow some timing variance, but no ticks after cancellation
        assert!((2..=4).contains(&after_cancel));
        assert!(counter.load(Ordering::SeqCst) <= after_cancel + 1);
    }
}
