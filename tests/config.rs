use std::{
    any::Any,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use rxr_core::{
    config::{self, Config, UnhandledErrorPolicy},
    MessageError, NotificationKind, Observable, ObservableExt, StreamError, Subscribeable,
    Subscriber, Subscription, UnsubscribeLogic, Unsubscribeable,
};

// The configuration is process-wide; tests touching it take turns.
static SERIAL: Mutex<()> = Mutex::new(());

fn with_config<R>(cfg: Config, f: impl FnOnce() -> R) -> R {
    let _turn = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
    config::set(cfg);
    let result = catch_unwind(AssertUnwindSafe(f));
    config::reset();
    match result {
        Ok(r) => r,
        Err(payload) => std::panic::resume_unwind(payload),
    }
}

fn recording_error_hook() -> (Config, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_c = Arc::clone(&seen);
    let cfg = Config {
        on_unhandled_error: Some(Arc::new(move |e: StreamError| {
            seen_c.lock().unwrap().push(e.to_string());
        })),
        unhandled_error_policy: UnhandledErrorPolicy::Log,
        ..Config::default()
    };
    (cfg, seen)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else {
        String::new()
    }
}

#[test]
fn default_config_rethrows_unhandled_errors() {
    let subscriber: Subscriber<i32> = Subscriber::on_next(|_| {});
    let subscriber_c = subscriber.clone();

    let result = with_config(Config::default(), || {
        catch_unwind(AssertUnwindSafe(|| {
            Observable::<i32>::throw_error(MessageError::stream("lost"))
                .map_to(1)
                .subscribe(subscriber_c);
        }))
    });

    let payload = result.expect_err("an unhandled error must not pass silently");
    assert!(panic_message(payload.as_ref()).contains("lost"));
    assert!(subscriber.is_closed());
}

#[test]
fn default_policy_is_panic() {
    assert_eq!(
        Config::default().unhandled_error_policy,
        UnhandledErrorPolicy::Panic
    );
}

#[test]
fn error_without_handler_reaches_the_hook() {
    let (cfg, seen) = recording_error_hook();
    with_config(cfg, || {
        Observable::<i32>::throw_error(MessageError::stream("nobody listens"))
            .map_to(())
            .subscribe(Subscriber::on_next(|_| {}));
    });
    assert_eq!(*seen.lock().unwrap(), vec!["nobody listens"]);
}

#[test]
fn handled_error_is_not_reported() {
    let (cfg, seen) = recording_error_hook();
    with_config(cfg, || {
        Observable::<i32>::throw_error(MessageError::stream("handled")).subscribe(
            Subscriber::new(|_| {}, |_| {}, || {}),
        );
    });
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn materialized_error_is_not_reported() {
    let (cfg, seen) = recording_error_hook();
    with_config(cfg, || {
        Observable::<i32>::throw_error(MessageError::stream("as data"))
            .materialize()
            .subscribe(Subscriber::on_next(|_| {}));
    });
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn panic_policy_panics_and_still_tears_down() {
    let cfg = Config {
        unhandled_error_policy: UnhandledErrorPolicy::Panic,
        ..Config::default()
    };
    let subscriber: Subscriber<i32> = Subscriber::on_next(|_| {});
    let subscriber_c = subscriber.clone();

    let result = with_config(cfg, || {
        catch_unwind(AssertUnwindSafe(|| {
            subscriber_c.error(MessageError::stream("fatal"));
        }))
    });

    assert!(result.is_err());
    assert!(subscriber.is_closed());
}

#[test]
fn stopped_notifications_reach_the_hook() {
    let kinds = Arc::new(Mutex::new(Vec::new()));
    let kinds_c = Arc::clone(&kinds);
    let cfg = Config {
        on_stopped_notification: Some(Arc::new(move |k: NotificationKind| {
            kinds_c.lock().unwrap().push(k);
        })),
        ..Config::default()
    };

    with_config(cfg, || {
        let s: Subscriber<i32> = Subscriber::empty();
        s.complete();
        s.next(1);
        s.error(MessageError::stream("late"));
        s.complete();
    });

    assert_eq!(
        *kinds.lock().unwrap(),
        vec![
            NotificationKind::Next,
            NotificationKind::Error,
            NotificationKind::Complete
        ]
    );
}

#[test]
fn fault_in_teardown_added_after_close_is_reported() {
    // Logged and handed to the hook rather than rethrown.
    let (cfg, seen) = recording_error_hook();
    with_config(cfg, || {
        let s = Subscription::new(UnsubscribeLogic::Nil);
        s.unsubscribe().unwrap();
        s.add(UnsubscribeLogic::Logic(Box::new(|| panic!("late teardown"))));
    });

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("late teardown"), "got {seen:?}");
}

#[test]
fn update_changes_a_single_field() {
    let _turn = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
    config::update(|c| c.unhandled_error_policy = UnhandledErrorPolicy::Log);
    let current = config::get();
    config::reset();

    assert_eq!(current.unhandled_error_policy, UnhandledErrorPolicy::Log);
    assert!(current.on_unhandled_error.is_none());
    assert_eq!(
        config::get().unhandled_error_policy,
        UnhandledErrorPolicy::Panic
    );
}

#[test]
fn stopped_hook_follows_update_and_reset() {
    let _turn = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_c = Arc::clone(&calls);

    let s: Subscriber<i32> = Subscriber::empty();
    s.complete();

    config::update(|c| {
        c.on_stopped_notification = Some(Arc::new(move |_: NotificationKind| {
            calls_c.fetch_add(1, Ordering::SeqCst);
        }));
    });
    s.next(1);
    s.next(2);
    config::reset();
    s.next(3);

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
