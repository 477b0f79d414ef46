//! Transformation stages built on the [`Operator`] contract.
//!
//! Each stage is available three ways: as an [`Operator`] value for
//! [`lift`], as a method on [`ObservableExt`], and as an operator function from
//! this module that can be handed to [`Observable::pipe`] and reused across
//! sources.
//!
//! [`Operator`]: crate::Operator
//! [`lift`]: crate::lift
//! [`ObservableExt`]: crate::ObservableExt
//! [`Observable::pipe`]: crate::Observable::pipe

mod dematerialize;
mod filter;
mod map;
mod map_to;
mod materialize;
mod take;

pub use dematerialize::{dematerialize, Dematerialize};
pub use filter::{filter, Filter};
pub use map::{map, Map};
pub use map_to::{map_to, MapTo};
pub use materialize::{materialize, Materialize};
pub use take::{take, Take};
