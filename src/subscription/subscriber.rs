use std::{
    collections::VecDeque,
    mem,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc, Mutex,
    },
};

use crate::{
    config,
    errors::StreamError,
    lock,
    notification::{Notification, NotificationKind},
    observer::{FnObserver, Observer},
    subscription::subscribe::{Subscription, UnsubscribeLogic, Unsubscribeable},
};

const ACTIVE: u8 = 0;
const STOPPED: u8 = 1;
const CLOSED: u8 = 2;

/// Lifecycle of a [`Subscriber`].
///
/// `Active` moves to `Stopped` on the first error or completion and from there to
/// `Closed` once the subscriber has been disposed. Cancellation moves straight
/// from `Active` to `Closed`. Nothing ever leaves `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    Active,
    Stopped,
    Closed,
}

type Destination<T> = Box<dyn Observer<NextFnType = T> + Send>;

struct Delivery<T> {
    destination: Option<Destination<T>>,
    // Set while one caller is running destination callbacks; others enqueue.
    draining: bool,
    pending: VecDeque<Notification<T>>,
}

struct SubscriberInner<T> {
    state: AtomicU8,
    delivery: Mutex<Delivery<T>>,
    subscription: Subscription,
}

impl<T> SubscriberInner<T> {
    fn close(&self) {
        self.state.store(CLOSED, Ordering::Release);
        let (destination, pending) = {
            let mut delivery = lock(&self.delivery);
            if delivery.draining {
                // The draining caller drops them once its callback returns.
                (None, VecDeque::new())
            } else {
                (delivery.destination.take(), mem::take(&mut delivery.pending))
            }
        };
        drop(destination);
        drop(pending);
    }
}

/// A type that acts as an observer, allowing users to handle emitted values, errors,
/// and completion when subscribing to an `Observable`.
///
/// A `Subscriber` guards a destination observer. It forwards values only while it
/// is active, forwards at most one terminal event and disposes itself right after
/// forwarding it. It is also a subscription: unsubscribing it cancels delivery
/// without notifying the destination and tears down everything registered with
/// [`add`].
///
/// The state flag is updated before the destination runs, so a destination that
/// synchronously calls back into the same subscriber sees the new state. Values
/// pushed from inside a running callback are queued and delivered, in order, as
/// soon as that callback returns; callbacks never run concurrently.
///
/// `Subscriber` is a cheap handle and clones share state. A producer typically
/// keeps one clone and polls [`is_closed`] between emissions.
///
/// [`add`]: Subscriber::add
/// [`is_closed`]: Unsubscribeable::is_closed
pub struct Subscriber<T> {
    inner: Arc<SubscriberInner<T>>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Subscriber {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> Subscriber<T> {
    /// Creates a new `Subscriber` instance with custom handling functions for emitted
    /// values, errors, and completion.
    pub fn new(
        next_fn: impl FnMut(T) + Send + 'static,
        error_fn: impl FnMut(StreamError) + Send + 'static,
        complete_fn: impl FnMut() + Send + 'static,
    ) -> Self {
        Self::from_observer(
            FnObserver::new()
                .with_next(next_fn)
                .with_error(error_fn)
                .with_complete(complete_fn),
        )
    }

    /// Create a new Subscriber with the provided `next` function.
    ///
    /// Errors delivered to this subscriber are reported as unhandled.
    pub fn on_next(next_fn: impl FnMut(T) + Send + 'static) -> Self {
        Self::from_observer(FnObserver::new().with_next(next_fn))
    }

    /// A subscriber that ignores values and completion.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_observer(FnObserver::new())
    }

    /// Wraps any [`Observer`] implementation.
    pub fn from_observer(observer: impl Observer<NextFnType = T> + Send + 'static) -> Self {
        let inner = Arc::new_cyclic(|weak| {
            let weak = weak.clone();
            SubscriberInner {
                state: AtomicU8::new(ACTIVE),
                delivery: Mutex::new(Delivery {
                    destination: Some(Box::new(observer) as Destination<T>),
                    draining: false,
                    pending: VecDeque::new(),
                }),
                subscription: Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        SubscriberInner::close(&inner);
                    }
                }))),
            }
        });
        Subscriber { inner }
    }

    /// Creates a subscriber owned by `destination`.
    ///
    /// The new subscriber is registered as a child of `destination`, so disposing
    /// the destination also disposes it. Operators use this to build the subscriber
    /// they hand to their source.
    pub fn chained<U>(
        destination: &Subscriber<U>,
        observer: impl Observer<NextFnType = T> + Send + 'static,
    ) -> Self {
        let s = Self::from_observer(observer);
        destination.add(s.subscription());
        s
    }
}

impl<T> Subscriber<T> {
    /// Delivers a value. Ignored unless the subscriber is active.
    pub fn next(&self, v: T) {
        if self.inner.state.load(Ordering::Acquire) != ACTIVE {
            config::report_stopped_notification(NotificationKind::Next);
            return;
        }
        self.deliver(Notification::Next(v));
    }

    /// Delivers an error, then disposes the subscriber. Only the first terminal
    /// event is forwarded.
    pub fn error(&self, e: StreamError) {
        if !self.stop() {
            config::report_stopped_notification(NotificationKind::Error);
            return;
        }
        self.deliver(Notification::Error(e));
    }

    /// Delivers completion, then disposes the subscriber. Only the first terminal
    /// event is forwarded.
    pub fn complete(&self) {
        if !self.stop() {
            config::report_stopped_notification(NotificationKind::Complete);
            return;
        }
        self.deliver(Notification::Complete);
    }

    #[must_use]
    pub fn state(&self) -> SubscriberState {
        match self.inner.state.load(Ordering::Acquire) {
            ACTIVE => SubscriberState::Active,
            STOPPED => SubscriberState::Stopped,
            _ => SubscriberState::Closed,
        }
    }

    /// Returns `true` once an error or completion was delivered, or the subscriber
    /// was disposed.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) != ACTIVE
    }

    /// Registers a teardown that runs when this subscriber is disposed.
    pub fn add(&self, teardown: impl Into<UnsubscribeLogic>) {
        self.inner.subscription.add(teardown);
    }

    /// The subscription that disposes this subscriber.
    #[must_use]
    pub fn subscription(&self) -> Subscription {
        self.inner.subscription.clone()
    }

    // ACTIVE -> STOPPED as a single checked write.
    fn stop(&self) -> bool {
        self.inner
            .state
            .compare_exchange(ACTIVE, STOPPED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn deliver(&self, notification: Notification<T>) {
        let mut destination = {
            let mut delivery = lock(&self.inner.delivery);
            if delivery.draining {
                delivery.pending.push_back(notification);
                return;
            }
            match delivery.destination.take() {
                Some(d) => {
                    delivery.draining = true;
                    d
                }
                None => return,
            }
        };

        let mut guard = DrainGuard {
            inner: &self.inner,
            armed: true,
        };
        let mut current = notification;
        loop {
            let terminal = current.is_terminal();
            current.accept(&mut destination);
            if terminal {
                self.dispose();
            }

            let mut delivery = lock(&self.inner.delivery);
            if self.inner.state.load(Ordering::Acquire) == CLOSED {
                delivery.draining = false;
                let pending = mem::take(&mut delivery.pending);
                drop(delivery);
                drop(pending);
                drop(destination);
                break;
            }
            match delivery.pending.pop_front() {
                Some(n) => current = n,
                None => {
                    delivery.destination = Some(destination);
                    delivery.draining = false;
                    break;
                }
            }
        }
        guard.armed = false;
    }

    fn dispose(&self) {
        if let Err(e) = self.inner.subscription.unsubscribe() {
            config::report_unhandled_error(Arc::new(e));
        }
    }
}

// Disposes the subscriber if a destination callback panics mid-delivery, so the
// chain is still torn down while the panic unwinds to the caller.
struct DrainGuard<'a, T> {
    inner: &'a Arc<SubscriberInner<T>>,
    armed: bool,
}

impl<T> Drop for DrainGuard<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let pending = {
            let mut delivery = lock(&self.inner.delivery);
            delivery.draining = false;
            mem::take(&mut delivery.pending)
        };
        drop(pending);
        // Faults are logged by `unsubscribe`; reporting them here could panic
        // again while unwinding.
        let _ = self.inner.subscription.unsubscribe();
    }
}

impl<T> Unsubscribeable for Subscriber<T> {
    fn unsubscribe(&self) -> Result<(), crate::errors::UnsubscriptionError> {
        self.inner.subscription.unsubscribe()
    }

    fn is_closed(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) == CLOSED || self.inner.subscription.is_closed()
    }
}

impl<T> Observer for Subscriber<T> {
    type NextFnType = T;

    fn next(&mut self, v: Self::NextFnType) {
        Subscriber::next(self, v);
    }

    fn complete(&mut self) {
        Subscriber::complete(self);
    }

    fn error(&mut self, e: StreamError) {
        Subscriber::error(self, e);
    }
}

impl<T: Send + 'static> From<FnObserver<T>> for Subscriber<T> {
    fn from(observer: FnObserver<T>) -> Self {
        Subscriber::from_observer(observer)
    }
}

impl<T> From<Subscriber<T>> for UnsubscribeLogic {
    fn from(subscriber: Subscriber<T>) -> Self {
        UnsubscribeLogic::Wrapped(subscriber.subscription())
    }
}

impl<T> std::fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("state", &self.state())
            .field("subscription", &self.inner.subscription)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MessageError;

    type Log = Arc<Mutex<Vec<String>>>;

    fn logging_subscriber() -> (Subscriber<i32>, Log) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let (l1, l2, l3) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
        let s = Subscriber::new(
            move |v| l1.lock().unwrap().push(format!("next {v}")),
            move |e| l2.lock().unwrap().push(format!("error {e}")),
            move || l3.lock().unwrap().push("complete".to_string()),
        );
        (s, log)
    }

    #[test]
    fn complete_stops_and_disposes() {
        let (s, log) = logging_subscriber();
        s.next(1);
        s.complete();
        s.next(2);
        s.complete();
        s.error(MessageError::stream("late"));

        assert_eq!(*log.lock().unwrap(), vec!["next 1", "complete"]);
        assert_eq!(s.state(), SubscriberState::Closed);
        assert!(s.is_closed());
    }

    #[test]
    fn error_is_delivered_once_and_excludes_completion() {
        let (s, log) = logging_subscriber();
        s.error(MessageError::stream("first"));
        s.error(MessageError::stream("second"));
        s.complete();
        s.next(5);

        assert_eq!(*log.lock().unwrap(), vec!["error first"]);
        assert!(s.is_closed());
    }

    #[test]
    fn unsubscribe_cancels_without_notifying() {
        let (s, log) = logging_subscriber();
        s.next(1);
        s.unsubscribe().unwrap();
        s.next(2);
        s.complete();

        assert_eq!(*log.lock().unwrap(), vec!["next 1"]);
        assert_eq!(s.state(), SubscriberState::Closed);
        assert!(s.unsubscribe().is_ok());
    }

    #[test]
    fn disposal_runs_added_teardowns() {
        let (s, _) = logging_subscriber();
        let torn_down = Arc::new(AtomicU8::new(0));
        let t = Arc::clone(&torn_down);
        s.add(UnsubscribeLogic::Logic(Box::new(move || {
            t.fetch_add(1, Ordering::SeqCst);
        })));
        s.complete();
        s.unsubscribe().unwrap();
        assert_eq!(torn_down.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reentrant_terminal_call_is_rejected() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let slot: Arc<Mutex<Option<Subscriber<i32>>>> = Arc::new(Mutex::new(None));
        let (l1, l2, slot_c) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&slot));

        let s = Subscriber::from_observer(
            FnObserver::new()
                .with_error(move |e| l1.lock().unwrap().push(format!("error {e}")))
                .with_complete(move || {
                    l2.lock().unwrap().push("complete".to_string());
                    let me = slot_c.lock().unwrap().clone();
                    if let Some(me) = me {
                        // Already stopped, so both calls are dropped.
                        me.complete();
                        me.error(MessageError::stream("reentrant"));
                    }
                }),
        );
        *slot.lock().unwrap() = Some(s.clone());

        s.complete();
        assert_eq!(*log.lock().unwrap(), vec!["complete"]);
        slot.lock().unwrap().take();
    }

    #[test]
    fn reentrant_values_are_queued_in_order() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let slot: Arc<Mutex<Option<Subscriber<i32>>>> = Arc::new(Mutex::new(None));
        let (l1, l2, slot_c) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&slot));

        let s = Subscriber::from_observer(
            FnObserver::new()
                .with_next(move |v: i32| {
                    l1.lock().unwrap().push(format!("next {v}"));
                    if v == 1 {
                        let me = slot_c.lock().unwrap().clone();
                        if let Some(me) = me {
                            me.next(2);
                            me.complete();
                            me.next(3);
                        }
                    }
                })
                .with_complete(move || l2.lock().unwrap().push("complete".to_string())),
        );
        *slot.lock().unwrap() = Some(s.clone());

        s.next(1);
        assert_eq!(*log.lock().unwrap(), vec!["next 1", "next 2", "complete"]);
        assert!(s.is_closed());
        slot.lock().unwrap().take();
    }

    #[test]
    fn reentrant_unsubscribe_drops_queued_values() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let slot: Arc<Mutex<Option<Subscriber<i32>>>> = Arc::new(Mutex::new(None));
        let (l1, slot_c) = (Arc::clone(&log), Arc::clone(&slot));

        let s = Subscriber::on_next(move |v: i32| {
            l1.lock().unwrap().push(format!("next {v}"));
            let me = slot_c.lock().unwrap().clone();
            if let Some(me) = me {
                me.next(v + 10);
                me.unsubscribe().unwrap();
            }
        });
        *slot.lock().unwrap() = Some(s.clone());

        s.next(1);
        s.next(2);
        assert_eq!(*log.lock().unwrap(), vec!["next 1"]);
        slot.lock().unwrap().take();
    }

    #[test]
    fn chained_subscriber_is_disposed_with_destination() {
        let (downstream, _) = logging_subscriber();
        let upstream: Subscriber<&str> = Subscriber::chained(&downstream, FnObserver::new());
        assert_eq!(downstream.subscription().child_count(), 1);

        downstream.unsubscribe().unwrap();
        assert!(upstream.is_closed());
    }

    #[test]
    fn terminated_chained_subscriber_detaches_from_destination() {
        let (downstream, _) = logging_subscriber();
        let upstream: Subscriber<&str> = Subscriber::chained(&downstream, FnObserver::new());
        upstream.complete();

        assert_eq!(downstream.subscription().child_count(), 0);
        assert!(!downstream.is_closed());
    }

    #[test]
    fn panicking_handler_disposes_subscriber() {
        let s: Subscriber<i32> = Subscriber::on_next(|_| panic!("handler failed"));
        let s_c = s.clone();
        let r = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || s_c.next(1)));
        assert!(r.is_err());
        assert!(s.is_closed());
    }
}
