//! The `observable` module provides the building blocks for creating and composing
//! observables.

pub mod operator;
pub mod operators;

use std::{sync::Arc, time::Duration};

use crate::{
    errors::StreamError,
    notification::Notification,
    observer::Observer,
    scheduler::Scheduler,
    subscription::{
        subscribe::{Subscribeable, Subscription, UnsubscribeLogic, Unsubscribeable},
        subscriber::Subscriber,
    },
};

use self::{
    operator::{lift, Operator},
    operators::{Dematerialize, Filter, Map, MapTo, Materialize, Take},
};

type SubscribeFn<T> = dyn Fn(Subscriber<T>) -> UnsubscribeLogic + Send + Sync;

/// The `Observable` struct represents a source of values that can be observed
/// and transformed.
///
/// An `Observable` is only a description: nothing runs until it is subscribed to,
/// and every subscription runs the producer again from scratch. Cloning is cheap
/// and shares the description, not an execution.
///
/// # Example: synchronous `Observable`
///
/// A synchronous producer delivers everything before `subscribe` returns. It polls
/// [`is_closed`] between emissions so that a consumer can cancel mid-stream.
///
/// ```
/// use std::sync::{Arc, Mutex};
///
/// use rxr_core::{Observable, ObservableExt, Subscribeable, Subscriber, Unsubscribeable};
///
/// let emit_10_observable = Observable::new(|subscriber| {
///     for i in 1..=10 {
///         if subscriber.is_closed() {
///             return;
///         }
///         subscriber.next(i);
///     }
///     subscriber.complete();
/// });
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let seen_c = Arc::clone(&seen);
/// emit_10_observable
///     .map(|v| v * 2)
///     .subscribe(Subscriber::on_next(move |v| seen_c.lock().unwrap().push(v)));
///
/// assert_eq!(seen.lock().unwrap().len(), 10);
/// ```
///
/// # Example: `Observable` with teardown
///
/// The value returned by the producer is registered with the subscriber and runs
/// exactly once, when the subscriber completes, errors or is unsubscribed.
///
/// ```
/// use std::sync::{
///     atomic::{AtomicBool, Ordering},
///     Arc,
/// };
///
/// use rxr_core::{Observable, Subscribeable, Subscriber, UnsubscribeLogic, Unsubscribeable};
///
/// let released = Arc::new(AtomicBool::new(false));
/// let released_c = Arc::clone(&released);
///
/// let observable: Observable<u32> = Observable::new(move |_subscriber| {
///     let released = Arc::clone(&released_c);
///     UnsubscribeLogic::Logic(Box::new(move || released.store(true, Ordering::SeqCst)))
/// });
///
/// let subscription = observable.subscribe(Subscriber::empty());
/// assert!(!released.load(Ordering::SeqCst));
///
/// subscription.unsubscribe().unwrap();
/// assert!(released.load(Ordering::SeqCst));
/// ```
///
/// [`is_closed`]: Unsubscribeable::is_closed
pub struct Observable<T> {
    subscribe_fn: Arc<SubscribeFn<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Observable {
            subscribe_fn: Arc::clone(&self.subscribe_fn),
        }
    }
}

impl<T: Send + 'static> Observable<T> {
    /// Creates a new `Observable` with the provided subscribe function.
    ///
    /// The subscribe function (`sf`) runs once per subscription with the
    /// `Subscriber` to deliver to. Whatever it returns is converted into
    /// [`UnsubscribeLogic`] and registered with that subscriber: return `()` when
    /// there is nothing to release, a [`Subscription`] for nested work, or an
    /// explicit `UnsubscribeLogic` value.
    pub fn new<R>(sf: impl Fn(Subscriber<T>) -> R + Send + Sync + 'static) -> Self
    where
        R: Into<UnsubscribeLogic>,
    {
        Observable {
            subscribe_fn: Arc::new(move |s: Subscriber<T>| -> UnsubscribeLogic { sf(s).into() }),
        }
    }

    /// Applies an operator function, such as those in [`operators`], to this
    /// observable.
    pub fn pipe<U, F>(&self, f: F) -> Observable<U>
    where
        F: FnOnce(&Observable<T>) -> Observable<U>,
    {
        f(self)
    }

    /// Subscribes any [`Observer`] implementation.
    pub fn subscribe_with(
        &self,
        observer: impl Observer<NextFnType = T> + Send + 'static,
    ) -> Subscription {
        self.subscribe(Subscriber::from_observer(observer))
    }

    /// An observable that completes immediately without emitting.
    #[must_use]
    pub fn empty() -> Self {
        Observable::new(|subscriber: Subscriber<T>| subscriber.complete())
    }

    /// An observable that never emits and never terminates.
    #[must_use]
    pub fn never() -> Self {
        Observable::new(|_: Subscriber<T>| {})
    }

    /// An observable that emits `error` immediately.
    #[must_use]
    pub fn throw_error(error: StreamError) -> Self {
        Observable::new(move |subscriber: Subscriber<T>| subscriber.error(Arc::clone(&error)))
    }

    /// Emits every item of `iterable` synchronously, then completes.
    ///
    /// The subscriber's closed state is checked before each emission, so
    /// cancelling from a handler stops the loop immediately.
    pub fn from_iterable<I>(iterable: I) -> Self
    where
        I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
    {
        Observable::new(move |subscriber: Subscriber<T>| {
            for v in iterable.clone() {
                if subscriber.is_closed() {
                    return;
                }
                subscriber.next(v);
            }
            subscriber.complete();
        })
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    /// Emits the given values in order, then completes.
    pub fn of(values: impl Into<Vec<T>>) -> Self {
        Observable::from_iterable(values.into())
    }
}

impl Observable<u64> {
    /// Emits `0` once `delay` has elapsed on `scheduler`, then completes.
    ///
    /// Unsubscribing before the delay elapses cancels the scheduled work.
    pub fn timer<S: Scheduler + 'static>(delay: Duration, scheduler: S) -> Self {
        let scheduler = Arc::new(scheduler);
        Observable::new(move |subscriber: Subscriber<u64>| {
            scheduler.schedule(
                delay,
                Box::new(move || {
                    subscriber.next(0);
                    subscriber.complete();
                }),
            )
        })
    }
}

impl<T: Send + 'static> Observable<Notification<T>> {
    /// Replays materialized notifications as real signals.
    #[must_use]
    pub fn dematerialize(&self) -> Observable<T> {
        lift(self, Dematerialize)
    }
}

impl<T: Send + 'static> Subscribeable for Observable<T> {
    type ObsType = T;

    fn subscribe(&self, subscriber: Subscriber<Self::ObsType>) -> Subscription {
        tracing::trace!(subscriber = ?subscriber, "subscribe");
        let teardown = (self.subscribe_fn)(subscriber.clone());
        subscriber.add(teardown);
        subscriber.subscription()
    }
}

/// Operators available on every [`Observable`].
pub trait ObservableExt<T: Send + 'static>: Subscribeable<ObsType = T> {
    /// Derives a new observable by interposing `operator` between this one and
    /// the eventual subscriber. See [`lift`](operator::lift).
    fn lift<U, O>(&self, operator: O) -> Observable<U>
    where
        U: Send + 'static,
        O: Operator<T, U> + 'static;

    /// Emits `value` once for every value emitted by the source.
    ///
    /// Errors and completion pass through unchanged, at the same position.
    fn map_to<V>(&self, value: V) -> Observable<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        self.lift(MapTo::new(value))
    }

    /// Emits every source event as a [`Notification`] value.
    ///
    /// A source error or completion is emitted as a final notification followed
    /// by completion; no error ever leaves this stage.
    fn materialize(&self) -> Observable<Notification<T>> {
        self.lift(Materialize)
    }

    /// Transforms the items emitted by the observable using a transformation
    /// function.
    fn map<U, F>(&self, f: F) -> Observable<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.lift(Map::new(f))
    }

    /// Filters the items emitted by the observable based on a predicate function.
    fn filter<P>(&self, predicate: P) -> Observable<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.lift(Filter::new(predicate))
    }

    /// Emits at most the first `n` items emitted by the observable, then
    /// completes and unsubscribes from the source.
    fn take(&self, n: usize) -> Observable<T> {
        self.lift(Take::new(n))
    }
}

impl<T: Send + 'static> ObservableExt<T> for Observable<T> {
    fn lift<U, O>(&self, operator: O) -> Observable<U>
    where
        U: Send + 'static,
        O: Operator<T, U> + 'static,
    {
        lift(self, operator)
    }
}
