//! Application lifecycle signals and the bridge into the countdown

use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::countdown::{Countdown, WeakCountdown};

/// The two lifecycle transitions the countdown cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleSignal {
    /// The host is about to stop running its event loop
    WillSuspend,
    /// The host returned to the foreground
    DidResume,
}

/// Callback invoked when a subscribed signal fires
pub type SignalCallback = Box<dyn Fn() + Send + Sync + 'static>;

/// Disposable registration returned by an event source.
///
/// Dropping the subscription unsubscribes; [`Subscription::cancel`] does
/// the same explicitly. Either way the callback is never invoked again.
pub struct Subscription {
    dispose: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap the event source's unsubscribe action
    pub fn new(dispose: impl FnOnce() + Send + 'static) -> Self {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    /// Unsubscribe now instead of on drop
    pub fn cancel(mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

/// Source of lifecycle signals the bridge subscribes to.
///
/// An explicit capability instead of a process-wide notification bus, so
/// hosts decide where the signals come from and tests can drive them
/// directly.
pub trait LifecycleEventSource: Send + Sync {
    /// Register `callback` for `signal` until the returned subscription is
    /// dropped
    fn subscribe(&self, signal: LifecycleSignal, callback: SignalCallback) -> Subscription;
}

#[derive(Default)]
struct HubInner {
    next_id: u64,
    subscribers: Vec<(u64, LifecycleSignal, Arc<dyn Fn() + Send + Sync>)>,
}

/// In-process lifecycle event source.
///
/// The host forwards its platform's suspend/resume notifications into
/// [`LifecycleHub::emit`]; subscribers are invoked synchronously in
/// subscription order.
#[derive(Clone, Default)]
pub struct LifecycleHub {
    inner: Arc<Mutex<HubInner>>,
}

impl LifecycleHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `signal` to every current subscriber
    pub fn emit(&self, signal: LifecycleSignal) {
        let callbacks: Vec<Arc<dyn Fn() + Send + Sync>> = {
            let inner = self.inner.lock().expect("lifecycle hub lock poisoned");
            inner
                .subscribers
                .iter()
                .filter(|(_, subscribed, _)| *subscribed == signal)
                .map(|(_, _, callback)| Arc::clone(callback))
                .collect()
        };

        debug!(?signal, subscribers = callbacks.len(), "emitting lifecycle signal");
        for callback in callbacks {
            callback();
        }
    }

    /// Number of live subscriptions, across both signals
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .expect("lifecycle hub lock poisoned")
            .subscribers
            .len()
    }
}

impl LifecycleEventSource for LifecycleHub {
    fn subscribe(&self, signal: LifecycleSignal, callback: SignalCallback) -> Subscription {
        let id = {
            let mut inner = self.inner.lock().expect("lifecycle hub lock poisoned");
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push((id, signal, Arc::from(callback)));
            id
        };

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                let mut inner = inner.lock().expect("lifecycle hub lock poisoned");
                inner.subscribers.retain(|(entry, _, _)| *entry != id);
            }
        })
    }
}

/// Forwards suspend/resume signals from an event source into a countdown.
///
/// `WillSuspend` invalidates the countdown so its finish time is
/// persisted; `DidResume` restores it. The bridge holds the countdown
/// weakly, so it never keeps a disposed engine alive.
pub struct LifecycleBridge {
    source: Arc<dyn LifecycleEventSource>,
    subscriptions: Vec<Subscription>,
}

impl LifecycleBridge {
    /// Bridge reading from `source`; call [`LifecycleBridge::attach`] to
    /// start forwarding
    pub fn new(source: Arc<dyn LifecycleEventSource>) -> Self {
        Self {
            source,
            subscriptions: Vec::new(),
        }
    }

    /// Subscribe both signals and forward them into `countdown`.
    ///
    /// Any previous attachment is dropped first, so re-attaching never
    /// duplicates registrations.
    pub fn attach(&mut self, countdown: &Countdown) {
        self.detach();

        let suspend_target = countdown.downgrade();
        let resume_target = countdown.downgrade();

        self.subscriptions.push(self.source.subscribe(
            LifecycleSignal::WillSuspend,
            Box::new(move || forward(&suspend_target, Countdown::invalidate)),
        ));
        self.subscriptions.push(self.source.subscribe(
            LifecycleSignal::DidResume,
            Box::new(move || forward(&resume_target, Countdown::restore)),
        ));
        info!("lifecycle bridge attached");
    }

    /// Drop both subscriptions; idempotent, and a no-op without a prior
    /// attach
    pub fn detach(&mut self) {
        if !self.subscriptions.is_empty() {
            self.subscriptions.clear();
            info!("lifecycle bridge detached");
        }
    }

    /// Whether the bridge currently forwards signals
    pub fn is_attached(&self) -> bool {
        !self.subscriptions.is_empty()
    }
}

fn forward(target: &WeakCountdown, operation: fn(&Countdown)) {
    match target.upgrade() {
        Some(countdown) => operation(&countdown),
        None => debug!("lifecycle signal dropped, countdown no longer alive"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn emit_reaches_only_matching_subscribers() {
        let hub = LifecycleHub::new();
        let suspends = Arc::new(AtomicUsize::new(0));
        let resumes = Arc::new(AtomicUsize::new(0));

        let suspends_clone = Arc::clone(&suspends);
        let _suspend_sub = hub.subscribe(
            LifecycleSignal::WillSuspend,
            Box::new(move || {
                suspends_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let resumes_clone = Arc::clone(&resumes);
        let _resume_sub = hub.subscribe(
            LifecycleSignal::DidResume,
            Box::new(move || {
                resumes_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        hub.emit(LifecycleSignal::WillSuspend);
        hub.emit(LifecycleSignal::WillSuspend);
        hub.emit(LifecycleSignal::DidResume);

        assert_eq!(suspends.load(Ordering::SeqCst), 2);
        assert_eq!(resumes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_a_subscription_unsubscribes() {
        let hub = LifecycleHub::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = Arc::clone(&count);
        let subscription = hub.subscribe(
            LifecycleSignal::WillSuspend,
            Box::new(move || {
                count_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert_eq!(hub.subscriber_count(), 1);

        drop(subscription);
        assert_eq!(hub.subscriber_count(), 0);

        hub.emit(LifecycleSignal::WillSuspend);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cancel_unsubscribes_explicitly() {
        let hub = LifecycleHub::new();
        let subscription = hub.subscribe(LifecycleSignal::DidResume, Box::new(|| {}));
        assert_eq!(hub.subscriber_count(), 1);

        subscription.cancel();
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn bridge_attach_detach_is_idempotent() {
        let hub = Arc::new(LifecycleHub::new());
        let countdown = Countdown::builder()
            .poll_scheduler(Arc::new(crate::poll::ManualPollScheduler::new()))
            .build();
        let mut bridge = LifecycleBridge::new(Arc::clone(&hub) as Arc<dyn LifecycleEventSource>);

        bridge.attach(&countdown);
        assert!(bridge.is_attached());
        assert_eq!(hub.subscriber_count(), 2);

        // Re-attach never duplicates registrations
        bridge.attach(&countdown);
        assert_eq!(hub.subscriber_count(), 2);

        bridge.detach();
        bridge.detach();
        assert!(!bridge.is_attached());
        assert_eq!(hub.subscriber_count(), 0);

        bridge.attach(&countdown);
        assert_eq!(hub.subscriber_count(), 2);
    }

    #[test]
    fn detach_without_attach_is_a_no_op() {
        let hub = Arc::new(LifecycleHub::new());
        let mut bridge = LifecycleBridge::new(hub as Arc<dyn LifecycleEventSource>);
        bridge.detach();
        assert!(!bridge.is_attached());
    }
}
