//! # weave-core
//!
//! Foundation types shared by every weave crate.
//!
//! - **Instance ids**: [`InstanceId`], the stable identity a host view model
//!   carries so side tables can key on it without owning the object
//! - **Values**: [`Value`] and [`ParamKind`], the dynamic argument model used
//!   by intercepted command invocations
//! - **Logging**: [`logging::init_subscriber`] and the in-memory capture layer
//!   used by tests

#![deny(unsafe_code)]

pub mod ids;
pub mod logging;
pub mod value;

pub use ids::InstanceId;
pub use value::{FromValue, ParamKind, Value};
