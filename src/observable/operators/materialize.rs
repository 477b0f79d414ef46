use crate::{
    notification::Notification,
    observable::{
        operator::{lift, Operator, OperatorSubscriber},
        Observable,
    },
    subscription::{
        subscribe::{Subscribeable, Subscription},
        subscriber::Subscriber,
    },
};

/// Turns every upstream event into a [`Notification`] value.
///
/// An upstream error or completion becomes one last notification followed by
/// completion, so this stage never emits an error itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct Materialize;

impl<T: Send + 'static> Operator<T, Notification<T>> for Materialize {
    fn call(
        &self,
        destination: Subscriber<Notification<T>>,
        source: &Observable<T>,
    ) -> Subscription {
        let upstream = OperatorSubscriber::new(&destination, |v, d: &Subscriber<_>| {
            d.next(Notification::Next(v));
        })
        .with_error(|e, d| {
            d.next(Notification::Error(e));
            d.complete();
        })
        .with_complete(|d| {
            d.next(Notification::Complete);
            d.complete();
        })
        .into_subscriber();
        source.subscribe(upstream)
    }
}

/// Operator function form of [`Materialize`].
pub fn materialize<T: Send + 'static>(
) -> impl Fn(&Observable<T>) -> Observable<Notification<T>> + Clone {
    |source: &Observable<T>| lift(source, Materialize)
}
