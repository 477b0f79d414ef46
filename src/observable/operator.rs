//! The composition contract every transformation stage is built on.

use crate::{
    errors::StreamError,
    observable::Observable,
    observer::Observer,
    subscription::{subscribe::Subscription, subscriber::Subscriber},
};

/// A stateless description of one pipeline stage.
///
/// `call` receives the downstream `destination` and the upstream `source`. It
/// builds a `Subscriber<S>` that transforms upstream events into downstream ones,
/// subscribes it to `source` and returns the resulting subscription. The same
/// operator value is shared by every subscription to the derived observable, so
/// per-subscription state belongs in the subscriber built by `call`, never in the
/// operator itself.
pub trait Operator<S, T>: Send + Sync {
    fn call(&self, destination: Subscriber<T>, source: &Observable<S>) -> Subscription;
}

impl<S, T, F> Operator<S, T> for F
where
    F: Fn(Subscriber<T>, &Observable<S>) -> Subscription + Send + Sync,
{
    fn call(&self, destination: Subscriber<T>, source: &Observable<S>) -> Subscription {
        self(destination, source)
    }
}

/// Derives a new observable that runs `operator` against `source` on every
/// subscription.
///
/// `source` is only cloned, never modified, so one source can back any number
/// of derived pipelines and every subscription is an independent execution.
pub fn lift<S, T, O>(source: &Observable<S>, operator: O) -> Observable<T>
where
    S: Send + 'static,
    T: Send + 'static,
    O: Operator<S, T> + 'static,
{
    let source = source.clone();
    Observable::new(move |destination| operator.call(destination, &source))
}

type OnNext<S, T> = Box<dyn FnMut(S, &Subscriber<T>) + Send>;
type OnError<T> = Box<dyn FnMut(StreamError, &Subscriber<T>) + Send>;
type OnComplete<T> = Box<dyn FnMut(&Subscriber<T>) + Send>;

/// Observer used by operators to sit between a source and a destination.
///
/// Only `on_next` is mandatory. Errors and completion are forwarded to the
/// destination unchanged unless a handler is supplied.
pub struct OperatorSubscriber<S, T> {
    destination: Subscriber<T>,
    on_next: OnNext<S, T>,
    on_error: Option<OnError<T>>,
    on_complete: Option<OnComplete<T>>,
}

impl<S: Send + 'static, T: Send + 'static> OperatorSubscriber<S, T> {
    pub fn new(
        destination: &Subscriber<T>,
        on_next: impl FnMut(S, &Subscriber<T>) + Send + 'static,
    ) -> Self {
        OperatorSubscriber {
            destination: destination.clone(),
            on_next: Box::new(on_next),
            on_error: None,
            on_complete: None,
        }
    }

    #[must_use]
    pub fn with_error(
        mut self,
        on_error: impl FnMut(StreamError, &Subscriber<T>) + Send + 'static,
    ) -> Self {
        self.on_error = Some(Box::new(on_error));
        self
    }

    #[must_use]
    pub fn with_complete(
        mut self,
        on_complete: impl FnMut(&Subscriber<T>) + Send + 'static,
    ) -> Self {
        self.on_complete = Some(Box::new(on_complete));
        self
    }

    /// Wraps this observer into a subscriber chained to the destination.
    #[must_use]
    pub fn into_subscriber(self) -> Subscriber<S> {
        let destination = self.destination.clone();
        Subscriber::chained(&destination, self)
    }
}

impl<S, T> Observer for OperatorSubscriber<S, T> {
    type NextFnType = S;

    fn next(&mut self, v: S) {
        (self.on_next)(v, &self.destination);
    }

    fn complete(&mut self) {
        match &mut self.on_complete {
            Some(cfn) => (cfn)(&self.destination),
            None => self.destination.complete(),
        }
    }

    fn error(&mut self, e: StreamError) {
        match &mut self.on_error {
            Some(efn) => (efn)(e, &self.destination),
            None => self.destination.error(e),
        }
    }
}
