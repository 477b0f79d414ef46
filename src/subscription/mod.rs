//! Provides structures and traits related to subscription management.
//!
//! This module includes `Subscriber`, the terminal-state guard that sits in front
//! of every observer, and `Subscription`, the tree of teardown units that is
//! returned from every `subscribe` call.
//!
//! Additionally, it defines the `UnsubscribeLogic` enum describing the kinds of
//! teardown a subscription can own and the `Unsubscribeable` trait shared by both
//! types.
pub mod subscribe;
pub mod subscriber;
