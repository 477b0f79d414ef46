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

/// Inverse of [`Materialize`](super::Materialize): replays upstream
/// notifications as real signals.
///
/// An upstream `Error` or `Complete` notification terminates the output. Real
/// upstream errors and completion are forwarded as usual.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dematerialize;

impl<T: Send + 'static> Operator<Notification<T>, T> for Dematerialize {
    fn call(
        &self,
        destination: Subscriber<T>,
        source: &Observable<Notification<T>>,
    ) -> Subscription {
        let upstream = OperatorSubscriber::new(&destination, |n, d: &Subscriber<T>| match n {
            Notification::Next(v) => d.next(v),
            Notification::Error(e) => d.error(e),
            Notification::Complete => d.complete(),
        })
        .into_subscriber();
        source.subscribe(upstream)
    }
}

/// Operator function form of [`Dematerialize`].
pub fn dematerialize<T: Send + 'static>(
) -> impl Fn(&Observable<Notification<T>>) -> Observable<T> + Clone {
    |source: &Observable<Notification<T>>| lift(source, Dematerialize)
}
