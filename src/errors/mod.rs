//! Error types shared by subscriptions and observables.
//!
//! Stream errors travel through the `error` channel of an [`Observer`] as a
//! [`StreamError`]. Faults raised while tearing a subscription down are
//! collected into an [`UnsubscriptionError`] so that one failing teardown never
//! prevents its siblings from running.
//!
//! [`Observer`]: crate::Observer

use std::{any::Any, error, fmt, sync::Arc};

use thiserror::Error;

/// Error value carried by the `error` channel of an observable.
pub type StreamError = Arc<dyn error::Error + Send + Sync>;

/// A single fault raised while running one teardown unit.
#[derive(Debug, Clone, Error)]
pub enum TeardownError {
    /// A fallible teardown returned an error.
    #[error("teardown failed: {0}")]
    Failed(StreamError),

    /// A teardown panicked. The payload is rendered to a string.
    #[error("teardown panicked: {0}")]
    Panicked(String),

    /// A future teardown was registered outside of a `Tokio` runtime.
    #[error("future teardown requires a Tokio runtime")]
    NoRuntime,
}

impl TeardownError {
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        TeardownError::Panicked(msg)
    }
}

/// Aggregate of every fault raised during one `unsubscribe()` call.
///
/// Faults from nested subscriptions are flattened into this list in the order
/// the teardowns ran.
#[derive(Debug, Clone)]
pub struct UnsubscriptionError {
    pub errors: Vec<TeardownError>,
}

impl UnsubscriptionError {
    pub(crate) fn new(errors: Vec<TeardownError>) -> Self {
        UnsubscriptionError { errors }
    }

    /// Number of teardowns that failed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for UnsubscriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error(s) occurred during unsubscription",
            self.errors.len()
        )?;
        for (i, e) in self.errors.iter().enumerate() {
            write!(f, "\n  {}) {}", i + 1, e)?;
        }
        Ok(())
    }
}

impl error::Error for UnsubscriptionError {}

/// Simple string-backed stream error, handy for producers that have no
/// dedicated error type of their own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct MessageError(pub String);

impl MessageError {
    /// Wraps the message into a [`StreamError`].
    pub fn stream(msg: impl Into<String>) -> StreamError {
        Arc::new(MessageError(msg.into()))
    }
}
