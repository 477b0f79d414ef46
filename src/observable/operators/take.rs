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

/// Emits at most the first `n` upstream values, then completes.
///
/// Completing disposes the destination, which in turn disposes the subscriber
/// given to the source. A source that polls its subscriber's closed state stops
/// right after the `n`th value.
#[derive(Debug, Clone, Copy)]
pub struct Take {
    count: usize,
}

impl Take {
    pub fn new(count: usize) -> Self {
        Take { count }
    }
}

impl<T: Send + 'static> Operator<T, T> for Take {
    fn call(&self, destination: Subscriber<T>, source: &Observable<T>) -> Subscription {
        let count = self.count;
        if count == 0 {
            destination.complete();
            return Subscription::empty();
        }

        let mut seen = 0;
        let upstream = OperatorSubscriber::new(&destination, move |v, d: &Subscriber<T>| {
            seen += 1;
            if seen <= count {
                d.next(v);
                if seen == count {
                    d.complete();
                }
            }
        })
        .into_subscriber();
        source.subscribe(upstream)
    }
}

/// Operator function form of [`Take`].
pub fn take<T: Send + 'static>(count: usize) -> impl Fn(&Observable<T>) -> Observable<T> + Clone {
    move |source: &Observable<T>| lift(source, Take::new(count))
}
