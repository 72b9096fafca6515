//! # weave-extender
//!
//! The surface extension modules and hosts use.
//!
//! - [`Extender`]: one per module; `register` its mixin types, then
//!   `enable` / `disable`
//! - [`Interceptor`]: the call sites a host wires into its view models'
//!   constructor, command dispatch, method returns, and teardown
//! - [`UserNotifier`]: how user-visible failures reach the player
//!
//! ```no_run
//! use weave_extender::{Extender, MixinRegistration};
//! # use weave_extender::mixins::*;
//! # struct Vm;
//! # impl ViewModel for Vm {
//! #     fn instance_id(&self) -> InstanceId { InstanceId::new() }
//! #     fn expose_property(&self, _: &str, _: PropertyAccessor) {}
//! # }
//! # impl TargetKind for Vm { const NAME: &'static str = "Vm"; }
//! # struct Extra;
//! # impl Mixin for Extra {}
//! # impl ViewModelMixin for Extra {
//! #     type Target = Vm;
//! #     fn create(_: TargetHandle<Vm>) -> Self { Extra }
//! # }
//! let extender = Extender::new("my_module");
//! extender.register([MixinRegistration::of::<Extra>()])?;
//! extender.enable()?;
//! # Ok::<(), weave_extender::ExtenderError>(())
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod extender;
pub mod interception;
pub mod notify;

pub use errors::{ExtenderError, Result};
pub use extender::{Extender, MixinRegistration};
pub use interception::Interceptor;
pub use notify::{TracingNotifier, UserNotifier};
#[cfg(any(test, feature = "test-utils"))]
pub use notify::MockUserNotifier;
pub use weave_mixins as mixins;

use weave_settings::WeaveSettings;

/// Install a stderr subscriber configured by `settings.logging`.
///
/// For hosts without their own `tracing` setup. No-op if a global
/// subscriber is already installed.
pub fn init_logging(settings: &WeaveSettings) {
    weave_core::logging::init_subscriber(&settings.logging.level, settings.logging.format);
}
