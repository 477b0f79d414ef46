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

/// Replaces every upstream value with a clone of a constant.
///
/// Errors and completion pass through untouched and in place.
#[derive(Debug, Clone)]
pub struct MapTo<V> {
    value: V,
}

impl<V> MapTo<V> {
    pub fn new(value: V) -> Self {
        MapTo { value }
    }
}

impl<S, V> Operator<S, V> for MapTo<V>
where
    S: Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn call(&self, destination: Subscriber<V>, source: &Observable<S>) -> Subscription {
        let value = self.value.clone();
        let upstream = OperatorSubscriber::new(&destination, move |_, d: &Subscriber<V>| {
            d.next(value.clone());
        })
        .into_subscriber();
        source.subscribe(upstream)
    }
}

/// Operator function form of [`MapTo`].
pub fn map_to<S, V>(value: V) -> impl Fn(&Observable<S>) -> Observable<V> + Clone
where
    S: Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    move |source: &Observable<S>| lift(source, MapTo::new(value.clone()))
}
