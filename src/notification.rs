//! Reified stream events.
//!
//! A [`Notification`] turns one of the three things an observable can signal
//! (a value, an error or completion) into an inert value that can be stored,
//! compared, or emitted by another observable. The [`materialize`] operator
//! produces notifications and [`dematerialize`] turns them back into signals.
//!
//! [`materialize`]: crate::ObservableExt::materialize
//! [`dematerialize`]: crate::Observable::dematerialize

use std::{fmt, sync::Arc};

use crate::{errors::StreamError, observable::Observable, observer::Observer};

/// Discriminant of a [`Notification`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Next,
    Error,
    Complete,
}

/// One of the three events an observable can deliver, as plain data.
pub enum Notification<T> {
    Next(T),
    Error(StreamError),
    Complete,
}

impl<T> Notification<T> {
    #[must_use]
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::Next(_) => NotificationKind::Next,
            Notification::Error(_) => NotificationKind::Error,
            Notification::Complete => NotificationKind::Complete,
        }
    }

    #[must_use]
    pub fn has_value(&self) -> bool {
        matches!(self, Notification::Next(_))
    }

    /// Returns `true` for error and completion notifications.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !self.has_value()
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Notification::Next(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Notification::Next(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&StreamError> {
        match self {
            Notification::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Transforms the carried value, leaving error and completion untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Notification<U> {
        match self {
            Notification::Next(v) => Notification::Next(f(v)),
            Notification::Error(e) => Notification::Error(e),
            Notification::Complete => Notification::Complete,
        }
    }

    /// Delivers this notification to the matching callback of `observer`.
    pub fn accept<O>(self, observer: &mut O)
    where
        O: Observer<NextFnType = T> + ?Sized,
    {
        match self {
            Notification::Next(v) => observer.next(v),
            Notification::Error(e) => observer.error(e),
            Notification::Complete => observer.complete(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Notification<T> {
    /// Builds a cold observable that replays this notification.
    ///
    /// A `Next` notification emits its value and then completes, the other two
    /// kinds emit only their terminal signal.
    #[must_use]
    pub fn into_observable(self) -> Observable<T> {
        Observable::new(move |subscriber| {
            match &self {
                Notification::Next(v) => {
                    subscriber.next(v.clone());
                    subscriber.complete();
                }
                Notification::Error(e) => subscriber.error(Arc::clone(e)),
                Notification::Complete => subscriber.complete(),
            };
        })
    }
}

impl<T: Clone> Clone for Notification<T> {
    fn clone(&self) -> Self {
        match self {
            Notification::Next(v) => Notification::Next(v.clone()),
            Notification::Error(e) => Notification::Error(Arc::clone(e)),
            Notification::Complete => Notification::Complete,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Notification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Next(v) => f.debug_tuple("Next").field(v).finish(),
            Notification::Error(e) => f.debug_tuple("Error").field(&e.to_string()).finish(),
            Notification::Complete => f.write_str("Complete"),
        }
    }
}

/// Errors compare equal when they are the same allocation or render the same
/// message, since `dyn Error` has no equality of its own.
impl<T: PartialEq> PartialEq for Notification<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Notification::Next(a), Notification::Next(b)) => a == b,
            (Notification::Error(a), Notification::Error(b)) => {
                Arc::ptr_eq(a, b) || a.to_string() == b.to_string()
            }
            (Notification::Complete, Notification::Complete) => true,
            _ => false,
        }
    }
}
