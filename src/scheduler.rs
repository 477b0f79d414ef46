//! Deferred execution.
//!
//! The engine itself delivers synchronously. A [`Scheduler`] is the boundary a
//! producer calls when it wants work to run later or elsewhere; the handle it gets
//! back is an ordinary [`Subscription`], so cancelling scheduled work composes with
//! the rest of the subscription tree.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::runtime::{Handle, TryCurrentError};

use crate::subscription::subscribe::{Subscription, UnsubscribeLogic};

/// A unit of deferred work.
pub type Work = Box<dyn FnOnce() + Send>;

pub trait Scheduler: Send + Sync {
    /// The scheduler's notion of the current time.
    fn now(&self) -> Instant {
        Instant::now()
    }

    /// Runs `work` once `delay` has elapsed. Unsubscribing the returned
    /// subscription before then cancels it.
    fn schedule(&self, delay: Duration, work: Work) -> Subscription;
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn schedule(&self, delay: Duration, work: Work) -> Subscription {
        (**self).schedule(delay, work)
    }
}

/// Runs work on the calling thread before `schedule` returns.
///
/// A non-zero `delay` blocks the calling thread with [`std::thread::sleep`], and
/// the returned subscription is already closed, so the work cannot be
/// cancelled. Use [`TokioScheduler`] for delays that must not block.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentThreadScheduler;

impl Scheduler for CurrentThreadScheduler {
    fn schedule(&self, delay: Duration, work: Work) -> Subscription {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        work();
        Subscription::empty()
    }
}

/// Spawns work as `Tokio` tasks.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        TokioScheduler { handle }
    }

    /// Uses the runtime the caller is running on.
    ///
    /// # Errors
    ///
    /// Fails when called outside of a `Tokio` runtime.
    pub fn current() -> Result<Self, TryCurrentError> {
        Handle::try_current().map(TokioScheduler::new)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, work: Work) -> Subscription {
        let join_handle = self.handle.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            work();
        });
        tracing::trace!(?delay, "work scheduled on tokio");
        Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
            join_handle.abort();
        })))
    }
}
