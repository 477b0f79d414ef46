//! The consumer side of an observable.

use crate::{config, errors::StreamError};

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;
type ErrorFn = Box<dyn FnMut(StreamError) + Send>;

/// Receives the events pushed by an observable.
///
/// Every callback has a default so that an implementor only writes the ones it
/// cares about. Missing `next` and `complete` callbacks do nothing. A missing
/// `error` callback does not swallow the error; it is reported through
/// [`config::report_unhandled_error`].
pub trait Observer {
    type NextFnType;

    fn next(&mut self, _: Self::NextFnType) {}

    fn complete(&mut self) {}

    fn error(&mut self, e: StreamError) {
        config::report_unhandled_error(e);
    }
}

impl<O: Observer + ?Sized> Observer for Box<O> {
    type NextFnType = O::NextFnType;

    fn next(&mut self, v: Self::NextFnType) {
        (**self).next(v);
    }

    fn complete(&mut self) {
        (**self).complete();
    }

    fn error(&mut self, e: StreamError) {
        (**self).error(e);
    }
}

/// An [`Observer`] assembled from any subset of closures.
///
/// ```
/// use rxr_core::FnObserver;
///
/// let observer = FnObserver::new()
///     .with_next(|v: i32| println!("got {v}"))
///     .with_complete(|| println!("done"));
/// # let _ = observer;
/// ```
pub struct FnObserver<T> {
    next_fn: Option<NextFn<T>>,
    error_fn: Option<ErrorFn>,
    complete_fn: Option<CompleteFn>,
}

impl<T> FnObserver<T> {
    /// An observer with no callbacks at all.
    #[must_use]
    pub fn new() -> Self {
        FnObserver {
            next_fn: None,
            error_fn: None,
            complete_fn: None,
        }
    }

    #[must_use]
    pub fn with_next(mut self, next_fn: impl FnMut(T) + Send + 'static) -> Self {
        self.next_fn = Some(Box::new(next_fn));
        self
    }

    #[must_use]
    pub fn with_error(mut self, error_fn: impl FnMut(StreamError) + Send + 'static) -> Self {
        self.error_fn = Some(Box::new(error_fn));
        self
    }

    #[must_use]
    pub fn with_complete(mut self, complete_fn: impl FnMut() + Send + 'static) -> Self {
        self.complete_fn = Some(Box::new(complete_fn));
        self
    }
}

impl<T> Default for FnObserver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Observer for FnObserver<T> {
    type NextFnType = T;

    fn next(&mut self, v: Self::NextFnType) {
        if let Some(nfn) = &mut self.next_fn {
            (nfn)(v);
        }
    }

    fn complete(&mut self) {
        if let Some(cfn) = &mut self.complete_fn {
            (cfn)();
        }
    }

    fn error(&mut self, e: StreamError) {
        match &mut self.error_fn {
            Some(efn) => (efn)(e),
            None => config::report_unhandled_error(e),
        }
    }
}
