#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use rxr_core::{Subscriber, UnsubscribeLogic};

/// Everything a subscriber received, by channel.
pub struct Emissions<T> {
    pub nexts: Vec<T>,
    pub errors: Vec<String>,
    pub completes: usize,
}

impl<T> Emissions<T> {
    pub fn terminal_count(&self) -> usize {
        self.errors.len() + self.completes
    }
}

pub fn register_emissions_subscriber<T: Send + 'static>(
) -> (Subscriber<T>, Arc<Mutex<Emissions<T>>>) {
    let emissions = Arc::new(Mutex::new(Emissions {
        nexts: Vec::new(),
        errors: Vec::new(),
        completes: 0,
    }));
    let (e1, e2, e3) = (
        Arc::clone(&emissions),
        Arc::clone(&emissions),
        Arc::clone(&emissions),
    );
    let subscriber = Subscriber::new(
        move |v| e1.lock().unwrap().nexts.push(v),
        move |e| e2.lock().unwrap().errors.push(e.to_string()),
        move || e3.lock().unwrap().completes += 1,
    );
    (subscriber, emissions)
}

/// A teardown that bumps `counter` when it runs.
pub fn counting_teardown(counter: &Arc<AtomicUsize>) -> UnsubscribeLogic {
    let counter = Arc::clone(counter);
    UnsubscribeLogic::Logic(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }))
}
