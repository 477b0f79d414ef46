//! Process-wide hooks for errors that have nowhere else to go.
//!
//! Two situations produce such errors: an observer without an `error` handler
//! receives a stream error, and a notification arrives at a subscriber that has
//! already stopped. Neither is silently discarded. Unhandled errors are logged,
//! passed to [`Config::on_unhandled_error`] and, under the default policy,
//! rethrown as a panic on the delivering thread. Stopped notifications are
//! logged at `debug` level and passed to [`Config::on_stopped_notification`].

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, OnceLock, PoisonError, RwLock,
};

use crate::{errors::StreamError, notification::NotificationKind};

type UnhandledErrorHook = Arc<dyn Fn(StreamError) + Send + Sync>;
type StoppedNotificationHook = Arc<dyn Fn(NotificationKind) + Send + Sync>;

/// What happens to a stream error that reached an observer without an
/// `error` handler, after the hook (if any) has seen it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnhandledErrorPolicy {
    /// Log at `error` level and carry on. Only visible with a `tracing`
    /// subscriber or an [`Config::on_unhandled_error`] hook installed.
    Log,

    /// Log, then panic on the delivering thread.
    #[default]
    Panic,
}

#[derive(Clone, Default)]
pub struct Config {
    pub on_unhandled_error: Option<UnhandledErrorHook>,
    pub on_stopped_notification: Option<StoppedNotificationHook>,
    pub unhandled_error_policy: UnhandledErrorPolicy,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("on_unhandled_error", &self.on_unhandled_error.is_some())
            .field(
                "on_stopped_notification",
                &self.on_stopped_notification.is_some(),
            )
            .field("unhandled_error_policy", &self.unhandled_error_policy)
            .finish()
    }
}

// Mirrors `on_stopped_notification.is_some()` so that a producer hammering a
// stopped subscriber does not clone the configuration on every call.
static STOPPED_HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

fn global() -> &'static RwLock<Config> {
    static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();
    CONFIG.get_or_init(|| RwLock::new(Config::default()))
}

/// Returns a snapshot of the current configuration.
pub fn get() -> Config {
    global()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replaces the current configuration.
pub fn set(config: Config) {
    update(|c| *c = config);
}

/// Modifies the current configuration in place.
pub fn update(f: impl FnOnce(&mut Config)) {
    let mut config = global().write().unwrap_or_else(PoisonError::into_inner);
    f(&mut config);
    STOPPED_HOOK_INSTALLED.store(config.on_stopped_notification.is_some(), Ordering::Release);
}

/// Restores the default configuration.
pub fn reset() {
    set(Config::default());
}

/// Surfaces a stream error that no observer handled.
///
/// # Panics
///
/// Panics when the policy is [`UnhandledErrorPolicy::Panic`].
pub fn report_unhandled_error(err: StreamError) {
    // Snapshot first so the hook may itself touch the configuration.
    let config = get();
    tracing::error!(error = %err, "unhandled observable error");

    if let Some(hook) = &config.on_unhandled_error {
        hook(Arc::clone(&err));
    }
    if config.unhandled_error_policy == UnhandledErrorPolicy::Panic {
        panic!("unhandled observable error: {err}");
    }
}

/// Surfaces a notification delivered to an already stopped subscriber.
pub fn report_stopped_notification(kind: NotificationKind) {
    tracing::debug!(?kind, "notification dropped by stopped subscriber");
    if !STOPPED_HOOK_INSTALLED.load(Ordering::Acquire) {
        return;
    }

    let hook = global()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .on_stopped_notification
        .clone();
    if let Some(hook) = hook {
        hook(kind);
    }
}
