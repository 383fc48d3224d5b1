//! The countdown engine

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::CountdownConfiguration;
use crate::duration::DurationBreakdown;
use crate::notification::{NotificationContent, NotificationScheduler, NotificationService};
use crate::persistence::{FinishTimeStore, MemoryStore};
use crate::poll::{PollHandle, PollScheduler, TokioPollScheduler};

/// Receives countdown events.
///
/// The engine holds its observer weakly and never extends its lifetime, so
/// the host owns the observer and simply drops it when it goes away.
/// Events are delivered synchronously from the poll-tick context; calling
/// back into the countdown from inside a callback is unsupported.
pub trait CountdownObserver: Send + Sync {
    /// Called on every poll tick while time remains
    fn on_fired(&self, remaining: DurationBreakdown);

    /// Called exactly once when the countdown completes or is skipped
    fn on_finished(&self);
}

/// Countdown phase; the target finish time exists exactly while the
/// countdown is running or suspended-while-running.
enum Phase {
    Idle,
    Running {
        finish_time: DateTime<Utc>,
        poll: PollHandle,
    },
    Suspended {
        finish_time: DateTime<Utc>,
    },
}

struct EngineState {
    total_duration: Duration,
    phase: Phase,
    observer: Option<Weak<dyn CountdownObserver>>,
    content: Option<NotificationContent>,
}

struct Shared {
    config: CountdownConfiguration,
    clock: Arc<dyn Clock>,
    store: Arc<dyn FinishTimeStore>,
    scheduler: Arc<dyn PollScheduler>,
    notifier: Option<NotificationScheduler>,
    state: Mutex<EngineState>,
}

fn notify_observer(
    observer: &Option<Weak<dyn CountdownObserver>>,
    deliver: impl FnOnce(&dyn CountdownObserver),
) {
    if let Some(observer) = observer.as_ref().and_then(Weak::upgrade) {
        deliver(observer.as_ref());
    }
}

fn to_chrono(interval: Duration) -> chrono::Duration {
    chrono::Duration::from_std(interval).unwrap_or(chrono::Duration::MAX)
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().expect("countdown state lock poisoned")
    }

    fn spawn_poll(self: &Arc<Self>) -> PollHandle {
        let weak = Arc::downgrade(self);
        self.scheduler.schedule(
            self.config.poll_interval(),
            self.config.poll_tolerance(),
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.tick();
                }
            }),
        )
    }

    fn start_with_finish_time(self: &Arc<Self>, finish_time: DateTime<Utc>) -> DateTime<Utc> {
        // The poll is scheduled before taking the state lock so schedulers
        // are free to lock their own registries inside `schedule`.
        let poll = self.spawn_poll();

        let content = {
            let mut state = self.lock();
            if let Phase::Running {
                finish_time: existing,
                ..
            } = &state.phase
            {
                let existing = *existing;
                debug!("start requested while already running, keeping existing target");
                poll.cancel();
                return existing;
            }
            state.phase = Phase::Running { finish_time, poll };
            state.content.clone()
        };

        info!(%finish_time, "countdown started");
        self.dispatch_notification(content, finish_time);
        finish_time
    }

    fn tick(&self) {
        let fired = {
            let state = self.lock();
            match &state.phase {
                Phase::Running { finish_time, .. } => {
                    let now = self.clock.now();
                    if now < *finish_time {
                        let remaining = (*finish_time - now).to_std().unwrap_or(Duration::ZERO);
                        Some((DurationBreakdown::from_interval(remaining), state.observer.clone()))
                    } else {
                        None
                    }
                }
                // Stale tick delivered after cancellation
                _ => return,
            }
        };

        match fired {
            Some((remaining, observer)) => {
                notify_observer(&observer, |obs| obs.on_fired(remaining));
            }
            None => {
                self.finish_running();
            }
        }
    }

    /// Running -> Idle transition; no-op in any other phase
    fn finish_running(&self) -> bool {
        let observer = {
            let mut state = self.lock();
            match std::mem::replace(&mut state.phase, Phase::Idle) {
                Phase::Running { poll, .. } => {
                    poll.cancel();
                    state.observer.clone()
                }
                other => {
                    state.phase = other;
                    return false;
                }
            }
        };

        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear persisted finish time");
        }
        self.cancel_pending_notification();
        info!("countdown finished");
        notify_observer(&observer, |obs| obs.on_finished());
        true
    }

    fn skip(&self) {
        if !self.finish_running() {
            debug!("skip ignored, countdown not running");
        }
    }

    fn invalidate(&self) {
        let persisted = {
            let mut state = self.lock();
            match std::mem::replace(&mut state.phase, Phase::Idle) {
                Phase::Running { finish_time, poll } => {
                    poll.cancel();
                    state.phase = Phase::Suspended { finish_time };
                    Some(finish_time)
                }
                other => {
                    state.phase = other;
                    None
                }
            }
        };

        match persisted {
            Some(finish_time) => {
                if let Err(err) = self.store.set(finish_time) {
                    warn!(error = %err, "failed to persist finish time");
                }
                info!(%finish_time, "countdown invalidated for suspension");
            }
            None => debug!("invalidate ignored, countdown not running"),
        }
    }

    fn restore(self: &Arc<Self>) {
        let persisted = match self.store.get() {
            Ok(slot) => slot,
            Err(err) => {
                warn!(error = %err, "failed to read persisted finish time");
                None
            }
        };

        let Some(finish_time) = persisted else {
            debug!("no persisted finish time, nothing to restore");
            return;
        };

        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear persisted finish time");
        }
        info!(%finish_time, "restoring countdown");
        self.start_with_finish_time(finish_time);
    }

    fn time_to_finish(&self) -> DurationBreakdown {
        let state = self.lock();
        let remaining = match &state.phase {
            Phase::Running { finish_time, .. } | Phase::Suspended { finish_time } => {
                // Targets already in the past clamp to zero
                (*finish_time - self.clock.now())
                    .to_std()
                    .unwrap_or(Duration::ZERO)
            }
            Phase::Idle => state.total_duration,
        };
        DurationBreakdown::from_interval(remaining)
    }

    fn adjust_time(&self, increase: bool, amount: Duration) {
        let reschedule = {
            let mut state = self.lock();
            let candidate = if increase {
                state.total_duration.checked_add(amount)
            } else {
                state.total_duration.checked_sub(amount)
            };

            let Some(candidate) = candidate else {
                debug!("duration adjustment out of range, ignored");
                return;
            };
            if candidate < self.config.min_duration() || candidate > self.config.max_duration() {
                debug!(
                    ?candidate,
                    "duration adjustment outside configured bounds, ignored"
                );
                return;
            }

            state.total_duration = candidate;
            let shift = to_chrono(amount);
            if let Phase::Running { finish_time, .. } = &mut state.phase {
                *finish_time = if increase {
                    *finish_time + shift
                } else {
                    *finish_time - shift
                };
                let finish_time = *finish_time;
                Some((state.content.clone(), finish_time))
            } else {
                None
            }
        };

        if let Some((content, finish_time)) = reschedule {
            self.dispatch_notification(content, finish_time);
        }
    }

    fn dispatch_notification(&self, content: Option<NotificationContent>, trigger_at: DateTime<Utc>) {
        let (Some(notifier), Some(content)) = (self.notifier.clone(), content) else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    notifier.schedule(content, trigger_at).await;
                });
            }
            Err(_) => warn!("no tokio runtime available, notification not scheduled"),
        }
    }

    fn cancel_pending_notification(&self) {
        let Some(notifier) = self.notifier.clone() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    notifier.cancel_all().await;
                });
            }
            Err(_) => warn!("no tokio runtime available, pending notification not cancelled"),
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Ok(state) = self.state.get_mut() {
            if let Phase::Running { poll, .. } = &state.phase {
                poll.cancel();
            }
        }
    }
}

/// Builder for a [`Countdown`].
///
/// Every collaborator is optional: without a store the finish time only
/// survives within the process, without a notification service and content
/// the side channel stays silent, and the default poll scheduler runs on
/// tokio.
pub struct CountdownBuilder {
    config: CountdownConfiguration,
    clock: Arc<dyn Clock>,
    store: Arc<dyn FinishTimeStore>,
    scheduler: Arc<dyn PollScheduler>,
    service: Option<Arc<dyn NotificationService>>,
    content: Option<NotificationContent>,
}

impl CountdownBuilder {
    fn new() -> Self {
        Self {
            config: CountdownConfiguration::default(),
            clock: Arc::new(SystemClock),
            store: Arc::new(MemoryStore::new()),
            scheduler: Arc::new(TokioPollScheduler),
            service: None,
            content: None,
        }
    }

    pub fn configuration(mut self, config: CountdownConfiguration) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Durable store the finish time is persisted to on suspend
    pub fn store(mut self, store: Arc<dyn FinishTimeStore>) -> Self {
        self.store = store;
        self
    }

    pub fn poll_scheduler(mut self, scheduler: Arc<dyn PollScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Wire the local-notification side channel.
    ///
    /// Scheduling happens on the ambient tokio runtime; without one the
    /// notification is skipped with a warning while the countdown itself
    /// is unaffected.
    pub fn notification_service(mut self, service: Arc<dyn NotificationService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Payload attached to the scheduled notification
    pub fn notification_content(mut self, content: NotificationContent) -> Self {
        self.content = Some(content);
        self
    }

    pub fn build(self) -> Countdown {
        let total_duration = self.config.default_duration();
        Countdown {
            shared: Arc::new(Shared {
                notifier: self.service.map(NotificationScheduler::new),
                config: self.config,
                clock: self.clock,
                store: self.store,
                scheduler: self.scheduler,
                state: Mutex::new(EngineState {
                    total_duration,
                    phase: Phase::Idle,
                    observer: None,
                    content: self.content,
                }),
            }),
        }
    }
}

/// Restartable, pausable countdown timer whose remaining time survives the
/// host application being suspended and resumed.
///
/// The countdown owns a target finish time and compares it against the
/// wall clock on every poll tick, emitting `on_fired` with the remaining
/// time broken down into days/hours/minutes/seconds, and `on_finished`
/// exactly once when the target passes or the countdown is skipped.
/// [`Countdown::invalidate`] stops polling and persists the target so
/// [`Countdown::restore`] can pick it up again after a suspend, however
/// long the process was away.
///
/// Handles are cheap clones of one shared engine; polling stops when the
/// last handle is dropped.
#[derive(Clone)]
pub struct Countdown {
    shared: Arc<Shared>,
}

impl Countdown {
    pub fn builder() -> CountdownBuilder {
        CountdownBuilder::new()
    }

    /// Countdown with the given configuration and default collaborators
    pub fn new(config: CountdownConfiguration) -> Self {
        Self::builder().configuration(config).build()
    }

    /// Register the observer receiving `on_fired` / `on_finished`.
    ///
    /// Only a weak reference is kept; at most one observer is registered
    /// at a time.
    pub fn set_observer<O>(&self, observer: &Arc<O>)
    where
        O: CountdownObserver + 'static,
    {
        let weak = Arc::downgrade(observer);
        let weak: Weak<dyn CountdownObserver> = weak;
        self.shared.lock().observer = Some(weak);
    }

    pub fn clear_observer(&self) {
        self.shared.lock().observer = None;
    }

    /// Start the countdown with the configured total duration, returning
    /// the computed target finish time.
    ///
    /// Starting while already running keeps the existing target and
    /// returns it.
    pub fn start(&self) -> DateTime<Utc> {
        let finish_time = {
            let state = self.shared.lock();
            if let Phase::Running { finish_time, .. } = &state.phase {
                return *finish_time;
            }
            self.shared.clock.now() + to_chrono(state.total_duration)
        };
        self.shared.start_with_finish_time(finish_time)
    }

    /// Start towards an absolute target finish time, as used by restore
    /// and by callers resuming an externally tracked countdown
    pub fn start_with_finish_time(&self, finish_time: DateTime<Utc>) -> DateTime<Utc> {
        self.shared.start_with_finish_time(finish_time)
    }

    /// Start with an explicit run time given as a breakdown
    pub fn start_with_run_time(&self, run_time: DurationBreakdown) -> DateTime<Utc> {
        let finish_time = self.shared.clock.now() + to_chrono(run_time.interval());
        self.shared.start_with_finish_time(finish_time)
    }

    /// Remaining time when running, the full configured duration when not;
    /// clamped at zero, never negative
    pub fn time_to_finish(&self) -> DurationBreakdown {
        self.shared.time_to_finish()
    }

    /// The configured total countdown length, independent of running state
    pub fn total_run_time(&self) -> DurationBreakdown {
        DurationBreakdown::from_interval(self.shared.lock().total_duration)
    }

    /// Lengthen the countdown by `amount`.
    ///
    /// No-op when the resulting total duration would exceed the configured
    /// maximum. While running, the target finish time shifts accordingly
    /// and the pending notification is rescheduled.
    pub fn increase_time(&self, amount: Duration) {
        self.shared.adjust_time(true, amount);
    }

    /// Shorten the countdown by `amount`.
    ///
    /// No-op when the resulting total duration would fall below the
    /// configured minimum; the minimum itself remains reachable.
    pub fn decrease_time(&self, amount: Duration) {
        self.shared.adjust_time(false, amount);
    }

    /// Force an immediate finish of a running countdown and cancel any
    /// pending notification; no-op when idle
    pub fn skip(&self) {
        self.shared.skip();
    }

    /// Stop polling and persist the target finish time for a later
    /// [`Countdown::restore`]; no-op when not running
    pub fn invalidate(&self) {
        self.shared.invalidate();
    }

    /// Resume from the persisted finish time, clearing the record.
    ///
    /// A target already in the past finishes on the next poll tick, so the
    /// observer still sees its `on_finished`. Without a persisted record
    /// this is a no-op.
    pub fn restore(&self) {
        self.shared.restore();
    }

    /// Whether a poll is currently active
    pub fn is_running(&self) -> bool {
        matches!(self.shared.lock().phase, Phase::Running { .. })
    }

    /// Non-owning handle for collaborators that must not keep the engine
    /// alive
    pub fn downgrade(&self) -> WeakCountdown {
        WeakCountdown {
            shared: Arc::downgrade(&self.shared),
        }
    }
}

/// Weak counterpart of [`Countdown`]; upgrading fails once every strong
/// handle has been dropped
#[derive(Clone)]
pub struct WeakCountdown {
    shared: Weak<Shared>,
}

impl WeakCountdown {
    pub fn upgrade(&self) -> Option<Countdown> {
        self.shared.upgrade().map(|shared| Countdown { shared })
    }
}
