//! # weave-mixins
//!
//! Per-instance mixins for closed view-model types.
//!
//! Independent modules attach extra properties and commands to instances of
//! host view models they cannot modify. This crate holds the core:
//!
//! - **Registry**: [`MixinRegistry`], which mixin types each module attaches
//!   to which target type, in registration order
//! - **Capabilities**: [`CapabilityBuilder`] / [`CapabilityIndex`], the
//!   name-keyed members a mixin exposes
//! - **Cache**: [`MixinInstanceCache`], mixins per live target instance,
//!   holding targets only weakly
//! - **Lifecycle**: [`Lifecycle`], idempotent attach on construct, refresh,
//!   and teardown
//! - **Dispatch**: [`dispatch::dispatch`], resolving one intercepted command
//!   across modules
//! - **Runtimes**: [`RuntimeRegistry`], the ordered set of modules and the
//!   entry point for every hook
//!
//! Hook entry points never return errors. Failures inside mixins are logged
//! with `tracing` and the host sees only the boolean dispatch verdict.

#![deny(unsafe_code)]

pub mod cache;
pub mod capability;
pub mod dispatch;
pub mod errors;
pub mod lifecycle;
pub mod mixin;
pub mod registry;
pub mod runtime;
pub mod target;

pub use cache::MixinInstanceCache;
pub use capability::{CapabilityBuilder, CapabilityIndex, CommandEntry, PropertyEntry};
pub use errors::MixinError;
pub use lifecycle::Lifecycle;
pub use mixin::{ConstructContext, Mixin, MixinInstance, MixinKey, MixinParts, MixinType, ViewModelMixin};
pub use registry::{MixinRegistry, Registration};
pub use runtime::{ModuleRuntime, RuntimeRegistry};
pub use target::{PropertyAccessor, PropertyTable, TargetHandle, TargetKind, TargetType, ViewModel};
pub use weave_core::{InstanceId, ParamKind, Value};
