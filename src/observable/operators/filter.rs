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

/// Forwards only the values for which the predicate returns `true`.
pub struct Filter<P> {
    predicate: Arc<P>,
}

impl<P> Filter<P> {
    pub fn new(predicate: P) -> Self {
        Filter {
            predicate: Arc::new(predicate),
        }
    }
}

impl<T, P> Operator<T, T> for Filter<P>
where
    T: Send + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn call(&self, destination: Subscriber<T>, source: &Observable<T>) -> Subscription {
        let predicate = Arc::clone(&self.predicate);
        let upstream = OperatorSubscriber::new(&destination, move |v, d: &Subscriber<T>| {
            if predicate(&v) {
                d.next(v);
            }
        })
        .into_subscriber();
        source.subscribe(upstream)
    }
}

/// Operator function form of [`Filter`].
pub fn filter<T, P>(predicate: P) -> impl Fn(&Observable<T>) -> Observable<T> + Clone
where
    T: Send + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    let predicate = Arc::new(predicate);
    move |source: &Observable<T>| {
        let predicate = Arc::clone(&predicate);
        lift(source, Filter::new(move |v: &T| predicate(v)))
    }
}
