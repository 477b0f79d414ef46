use std::{
    future::Future,
    mem,
    panic::{catch_unwind, AssertUnwindSafe},
    pin::Pin,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, Weak,
    },
};

use tokio::runtime;

use crate::{
    config,
    errors::{StreamError, TeardownError, UnsubscriptionError},
    lock,
    subscription::subscriber::Subscriber,
};

/// A trait for types that can be subscribed to, allowing consumers to receive
/// values emitted by an observable stream.
pub trait Subscribeable {
    /// The type of items emitted by the observable stream.
    type ObsType;

    /// Subscribes to the observable stream and specifies how to handle emitted values.
    ///
    /// The `Subscriber` parameter defines the behavior for processing values emitted
    /// by the observable stream. The returned `Subscription` disposes that subscriber
    /// and everything the stream attached to it.
    fn subscribe(&self, s: Subscriber<Self::ObsType>) -> Subscription;
}

/// A trait for types that can be unsubscribed, allowing the clean release of resources
/// associated with a subscription. This trait is typically used to signal the
/// `Observable` to stop emitting values.
pub trait Unsubscribeable {
    /// Unsubscribes and releases every resource held by the subscription.
    ///
    /// The first call closes the subscription, detaches it from its parent and runs
    /// every registered teardown exactly once, in registration order. Further calls
    /// do nothing and return `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns every fault raised by the teardowns of this call, flattened across
    /// nested subscriptions. All teardowns run even if some of them fail.
    fn unsubscribe(&self) -> Result<(), UnsubscriptionError>;

    /// Returns `true` once `unsubscribe` has started.
    fn is_closed(&self) -> bool;
}

/// Enumerates various unsubscribe logic options for a subscription.
pub enum UnsubscribeLogic {
    /// No specific unsubscribe logic.
    Nil,

    /// If one subscription depends on another. Wrapped subscription's unsubscribe
    /// will be called upon unsubscribing.
    Wrapped(Subscription),

    /// Unsubscribe logic defined by a function.
    Logic(Box<dyn FnOnce() + Send>),

    /// Unsubscribe logic that can fail. The error is collected into the
    /// [`UnsubscriptionError`] returned by `unsubscribe`.
    Fallible(Box<dyn FnOnce() -> Result<(), StreamError> + Send>),

    /// Asynchronous unsubscribe logic represented by a future. It is spawned on
    /// the `Tokio` runtime that was current when the owning subscription was made.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

impl UnsubscribeLogic {
    fn is_nil(&self) -> bool {
        matches!(self, UnsubscribeLogic::Nil)
    }

    fn unsubscribe(
        self,
        runtime_handle: Option<&runtime::Handle>,
        errors: &mut Vec<TeardownError>,
    ) {
        match self {
            UnsubscribeLogic::Nil => (),
            UnsubscribeLogic::Wrapped(subscription) => {
                if let Err(e) = subscription.unsubscribe() {
                    errors.extend(e.errors);
                }
            }
            UnsubscribeLogic::Logic(fnc) => {
                if let Err(payload) = catch_unwind(AssertUnwindSafe(fnc)) {
                    errors.push(TeardownError::from_panic(payload));
                }
            }
            UnsubscribeLogic::Fallible(fnc) => match catch_unwind(AssertUnwindSafe(fnc)) {
                Ok(Ok(())) => (),
                Ok(Err(e)) => errors.push(TeardownError::Failed(e)),
                Err(payload) => errors.push(TeardownError::from_panic(payload)),
            },
            UnsubscribeLogic::Future(future) => {
                let handle = runtime_handle
                    .cloned()
                    .or_else(|| runtime::Handle::try_current().ok());
                match handle {
                    Some(handle) => {
                        handle.spawn(future);
                    }
                    None => errors.push(TeardownError::NoRuntime),
                }
            }
        }
    }
}

impl From<()> for UnsubscribeLogic {
    fn from(_: ()) -> Self {
        UnsubscribeLogic::Nil
    }
}

impl From<Subscription> for UnsubscribeLogic {
    fn from(subscription: Subscription) -> Self {
        UnsubscribeLogic::Wrapped(subscription)
    }
}

impl From<Box<dyn FnOnce() + Send>> for UnsubscribeLogic {
    fn from(fnc: Box<dyn FnOnce() + Send>) -> Self {
        UnsubscribeLogic::Logic(fnc)
    }
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

struct Teardowns {
    initial: UnsubscribeLogic,
    children: Vec<UnsubscribeLogic>,
}

struct SubscriptionInner {
    id: u64,
    closed: AtomicBool,
    teardowns: Mutex<Teardowns>,
    // Non-owning; only used to detach from the parent on unsubscribe.
    parent: Mutex<Option<Weak<SubscriptionInner>>>,
    runtime_handle: Option<runtime::Handle>,
}

impl SubscriptionInner {
    fn remove_child(&self, id: u64) {
        let removed = {
            let mut teardowns = lock(&self.teardowns);
            teardowns
                .children
                .iter()
                .position(|c| matches!(c, UnsubscribeLogic::Wrapped(s) if s.inner.id == id))
                .map(|i| teardowns.children.remove(i))
        };
        // Drop outside the lock.
        drop(removed);
    }
}

/// A disposable resource that owns a tree of teardown units.
///
/// `Subscription` is a cheap handle: clones refer to the same resource, so one
/// clone may be handed to a consumer while another is registered as a child of a
/// parent subscription. Dropping a handle does not unsubscribe.
///
/// Unsubscribing is idempotent. The first call detaches the subscription from its
/// parent, then runs its own logic followed by every child in the order they were
/// added. A child added after the subscription closed is torn down immediately.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
}

impl Subscription {
    /// Creates a new open `Subscription` whose own teardown is `unsubscribe_logic`.
    ///
    /// The `unsubscribe_logic` parameter defines the logic to execute upon
    /// unsubscribing. See [`UnsubscribeLogic`] for the available strategies.
    #[must_use]
    pub fn new(unsubscribe_logic: UnsubscribeLogic) -> Self {
        Subscription {
            inner: Arc::new(SubscriptionInner {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                closed: AtomicBool::new(false),
                teardowns: Mutex::new(Teardowns {
                    initial: unsubscribe_logic,
                    children: Vec::new(),
                }),
                parent: Mutex::new(None),
                runtime_handle: runtime::Handle::try_current().ok(),
            }),
        }
    }

    /// A subscription that is already closed.
    #[must_use]
    pub fn empty() -> Self {
        let s = Subscription::new(UnsubscribeLogic::Nil);
        s.inner.closed.store(true, Ordering::Release);
        s
    }

    /// Registers a teardown to run when this subscription is unsubscribed.
    ///
    /// If this subscription is already closed, the teardown runs right away and any
    /// fault it raises is reported through [`config::report_unhandled_error`].
    ///
    /// Adding a subscription makes this one its parent. Adding a subscription to
    /// itself, adding one that is already closed, or adding one that already has a
    /// parent does nothing; a subscription belongs to at most one parent.
    pub fn add(&self, teardown: impl Into<UnsubscribeLogic>) {
        let teardown = teardown.into();
        if teardown.is_nil() {
            return;
        }

        if let UnsubscribeLogic::Wrapped(child) = &teardown {
            if Arc::ptr_eq(&child.inner, &self.inner) || child.is_closed() {
                return;
            }
            let mut parent = lock(&child.inner.parent);
            if let Some(existing) = parent.as_ref().and_then(Weak::upgrade) {
                if !Arc::ptr_eq(&existing, &self.inner) {
                    tracing::warn!(
                        child = child.inner.id,
                        parent = existing.id,
                        "subscription already has a parent, ignoring add"
                    );
                }
                return;
            }
            *parent = Some(Arc::downgrade(&self.inner));
        }

        let rejected = {
            let mut teardowns = lock(&self.inner.teardowns);
            // Checked under the lock so a concurrent unsubscribe either sees the
            // child or we see `closed`.
            if self.is_closed() {
                Some(teardown)
            } else {
                teardowns.children.push(teardown);
                None
            }
        };

        if let Some(teardown) = rejected {
            let mut errors = Vec::new();
            teardown.unsubscribe(self.inner.runtime_handle.as_ref(), &mut errors);
            if !errors.is_empty() {
                config::report_unhandled_error(Arc::new(UnsubscriptionError::new(errors)));
            }
        }
    }

    /// Removes a child subscription without unsubscribing it.
    pub fn remove(&self, child: &Subscription) {
        let mut parent = lock(&child.inner.parent);
        let is_ours = parent
            .as_ref()
            .is_some_and(|p| std::ptr::eq(p.as_ptr(), Arc::as_ptr(&self.inner)));
        if is_ours {
            *parent = None;
        }
        drop(parent);
        self.inner.remove_child(child.inner.id);
    }

    /// Number of teardown units currently registered as children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        lock(&self.inner.teardowns).children.len()
    }

    /// Returns `true` if both handles refer to the same subscription.
    #[must_use]
    pub fn ptr_eq(&self, other: &Subscription) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Unsubscribeable for Subscription {
    fn unsubscribe(&self) -> Result<(), UnsubscriptionError> {
        {
            // Flipped under the lock that `add` checks `closed` with.
            let _teardowns = lock(&self.inner.teardowns);
            if self.inner.closed.swap(true, Ordering::AcqRel) {
                return Ok(());
            }
        }
        tracing::trace!(id = self.inner.id, "unsubscribing");

        // Detach first so the parent never holds a torn-down child.
        let parent = lock(&self.inner.parent).take();
        if let Some(parent) = parent.and_then(|p| p.upgrade()) {
            parent.remove_child(self.inner.id);
        }

        let (initial, children) = {
            let mut teardowns = lock(&self.inner.teardowns);
            (
                mem::replace(&mut teardowns.initial, UnsubscribeLogic::Nil),
                mem::take(&mut teardowns.children),
            )
        };

        let handle = self.inner.runtime_handle.as_ref();
        let mut errors = Vec::new();
        initial.unsubscribe(handle, &mut errors);
        for child in children {
            child.unsubscribe(handle, &mut errors);
        }

        if errors.is_empty() {
            return Ok(());
        }
        for e in &errors {
            tracing::warn!(id = self.inner.id, error = %e, "teardown fault");
        }
        Err(UnsubscriptionError::new(errors))
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.inner.id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
