//! Push-based observables with explicit, cooperative cancellation.
//!
//! An [`Observable`] describes how to produce a sequence of values over time.
//! Subscribing runs that description against a [`Subscriber`], which guards the
//! consumer: it forwards values while active, forwards at most one error or
//! completion, and disposes itself afterwards. Every `subscribe` call returns a
//! [`Subscription`], a tree of teardown units that is released exactly once no
//! matter how many times it is unsubscribed.
//!
//! New observables are derived with [`lift`] and an [`Operator`], which places a
//! transforming subscriber between the source and the consumer without touching
//! the source. [`ObservableExt`] exposes the bundled operators as methods and the
//! [`operators`] module exposes them as reusable operator functions for
//! [`Observable::pipe`].
//!
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use rxr_core::{Notification, Observable, ObservableExt, Subscribeable, Subscriber};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let seen_c = Arc::clone(&seen);
//!
//! Observable::of([1, 2, 3])
//!     .map_to("tick")
//!     .materialize()
//!     .subscribe(Subscriber::on_next(move |n| seen_c.lock().unwrap().push(n)));
//!
//! assert_eq!(
//!     *seen.lock().unwrap(),
//!     vec![
//!         Notification::Next("tick"),
//!         Notification::Next("tick"),
//!         Notification::Next("tick"),
//!         Notification::Complete,
//!     ]
//! );
//! ```
//!
//! Delivery is synchronous. Producers that want to run later or on another
//! thread go through a [`Scheduler`], whose handles are ordinary subscriptions.

pub mod config;
mod errors;
pub mod notification;
pub mod observable;
pub mod observer;
pub mod scheduler;
mod subscription;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use errors::*;
pub use notification::{Notification, NotificationKind};
pub use observable::{
    operator::{lift, Operator, OperatorSubscriber},
    operators, Observable, ObservableExt,
};
pub use observer::{FnObserver, Observer};
pub use scheduler::{CurrentThreadScheduler, Scheduler, TokioScheduler};
pub use subscription::subscribe::{Subscribeable, Subscription, UnsubscribeLogic, Unsubscribeable};
pub use subscription::subscriber::{Subscriber, SubscriberState};

/// Subscription types, grouped the way the crate lays them out.
pub mod subscribe {
    pub use crate::subscription::subscribe::*;
    pub use crate::subscription::subscriber::*;
}

// No callback ever runs while one of the crate's locks is held, so a poisoned
// lock still guards consistent data.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
