//! Frame-based scripting for synchronous pipelines.
//!
//! A diagram is read one character per frame: `-` is an empty frame, `|` is
//! completion, `#` is an error and any other character is emitted as a value.
#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use rxr_core::{
    MessageError, Notification, Observable, Observer, StreamError, Subscriber, Unsubscribeable,
};

pub const ERROR_MESSAGE: &str = "marble error";

pub type Recorded<T> = Arc<Mutex<Vec<(usize, Notification<T>)>>>;

/// Virtual clock advanced by cold sources as they walk their diagram.
#[derive(Clone, Default)]
pub struct Clock(Arc<AtomicUsize>);

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn set(&self, frame: usize) {
        self.0.store(frame, Ordering::SeqCst);
    }
}

pub fn marble_error() -> StreamError {
    MessageError::stream(ERROR_MESSAGE)
}

/// A cold source that replays `diagram` on every subscription.
pub fn cold(diagram: &'static str, clock: &Clock) -> Observable<char> {
    let clock = clock.clone();
    Observable::new(move |o: Subscriber<char>| {
        for (frame, c) in diagram.chars().enumerate() {
            if o.is_closed() {
                return;
            }
            clock.set(frame);
            match c {
                '-' => {}
                '|' => return o.complete(),
                '#' => return o.error(marble_error()),
                v => o.next(v),
            }
        }
    })
}

/// Parses an expected diagram, mapping every value character through `value`.
pub fn expected<T>(diagram: &str, value: impl Fn(char) -> T) -> Vec<(usize, Notification<T>)> {
    diagram
        .chars()
        .enumerate()
        .filter_map(|(frame, c)| match c {
            '-' => None,
            '|' => Some((frame, Notification::Complete)),
            '#' => Some((frame, Notification::Error(marble_error()))),
            v => Some((frame, Notification::Next(value(v)))),
        })
        .collect()
}

struct Recorder<T> {
    clock: Clock,
    log: Recorded<T>,
}

impl<T> Recorder<T> {
    fn push(&self, n: Notification<T>) {
        self.log.lock().unwrap().push((self.clock.now(), n));
    }
}

impl<T> Observer for Recorder<T> {
    type NextFnType = T;

    fn next(&mut self, v: T) {
        self.push(Notification::Next(v));
    }

    fn error(&mut self, e: StreamError) {
        self.push(Notification::Error(e));
    }

    fn complete(&mut self) {
        self.push(Notification::Complete);
    }
}

/// A subscriber that stamps everything it receives with the current frame.
pub fn record<T: Send + 'static>(clock: &Clock) -> (Subscriber<T>, Recorded<T>) {
    let log: Recorded<T> = Arc::new(Mutex::new(Vec::new()));
    let subscriber = Subscriber::from_observer(Recorder {
        clock: clock.clone(),
        log: Arc::clone(&log),
    });
    (subscriber, log)
}
