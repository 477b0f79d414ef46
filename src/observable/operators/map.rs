use std::sync::Arc;

use crate::{
    observable::{
        operator::{lift, Operator, OperatorSubscriber},
        Observable,
    },
    subscription::{
        subscribe::{Subscribeable, Subscription},
        subscriber::Subscriber,
    },
};

/// Transforms each upstream value with a projection function.
pub struct Map<F> {
    f: Arc<F>,
}

impl<F> Map<F> {
    pub fn new(f: F) -> Self {
        Map { f: Arc::new(f) }
    }
}

impl<S, U, F> Operator<S, U> for Map<F>
where
    S: Send + 'static,
    U: Send + 'static,
    F: Fn(S) -> U + Send + Sync + 'static,
{
    fn call(&self, destination: Subscriber<U>, source: &Observable<S>) -> Subscription {
        let f = Arc::clone(&self.f);
        let upstream = OperatorSubscriber::new(&destination, move |v, d: &Subscriber<U>| {
            d.next(f(v));
        })
        .into_subscriber();
        source.subscribe(upstream)
    }
}

/// Operator function form of [`Map`].
pub fn map<S, U, F>(f: F) -> impl Fn(&Observable<S>) -> Observable<U> + Clone
where
    S: Send + 'static,
    U: Send + 'static,
    F: Fn(S) -> U + Send + Sync + 'static,
{
    let f = Arc::new(f);
    move |source: &Observable<S>| {
        let f = Arc::clone(&f);
        lift(source, Map::new(move |v: S| f(v)))
    }
}
