//! The per-module façade.
//!
//! A module creates one [`Extender`] under its name, registers its mixin
//! types once, then enables or disables itself. Misuse (loading the same
//! module twice, enabling before registering) is reported to the user
//! through the [`UserNotifier`] as well as returned.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};
use weave_mixins::{MixinError, MixinType, ModuleRuntime, RuntimeRegistry, TargetType, ViewModelMixin};

use crate::errors::{ExtenderError, Result};
use crate::notify::{TracingNotifier, UserNotifier};

/// A mixin type queued for registration, with an optional refresh method
/// that overrides the type's own default.
#[derive(Clone, Debug)]
pub struct MixinRegistration {
    mixin: MixinType,
    refresh_method: Option<String>,
}

impl MixinRegistration {
    /// Registration for `M`.
    #[must_use]
    pub fn of<M: ViewModelMixin>() -> Self {
        MixinType::of::<M>().into()
    }

    /// Refresh the mixin after `method` returns on its target.
    #[must_use]
    pub fn refresh_on(mut self, method: impl Into<String>) -> Self {
        self.refresh_method = Some(method.into());
        self
    }

    /// The mixin type.
    #[must_use]
    pub fn mixin(&self) -> &MixinType {
        &self.mixin
    }
}

impl From<MixinType> for MixinRegistration {
    fn from(mixin: MixinType) -> Self {
        Self {
            mixin,
            refresh_method: None,
        }
    }
}

/// Façade one extension module uses to attach its mixins.
pub struct Extender {
    name: String,
    runtimes: Arc<RuntimeRegistry>,
    notifier: Arc<dyn UserNotifier>,
    runtime: Mutex<Option<Arc<ModuleRuntime>>>,
}

impl Extender {
    /// Extender for module `name` on the process-wide registry.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_registry(name, RuntimeRegistry::global())
    }

    /// Extender for module `name` on a specific registry.
    pub fn with_registry(name: impl Into<String>, runtimes: Arc<RuntimeRegistry>) -> Self {
        Self {
            name: name.into(),
            runtimes,
            notifier: Arc::new(TracingNotifier),
            runtime: Mutex::new(None),
        }
    }

    /// Replace the user notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn UserNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create the module runtime and register `mixins` with it, in order.
    ///
    /// Fails if a module with this name is already loaded; the loaded module
    /// is left as it is and the user is told. A mixin type that cannot be
    /// registered is reported and skipped; the rest still register.
    pub fn register<I>(&self, mixins: I) -> Result<Arc<ModuleRuntime>>
    where
        I: IntoIterator<Item = MixinRegistration>,
    {
        info!(module = %self.name, "registering module");
        let runtime = match self.runtimes.register(&self.name) {
            Ok(runtime) => runtime,
            Err(err @ MixinError::DuplicateModule { .. }) => {
                self.notifier
                    .display_user_error(&format!("Failed to load extension module {} - already loaded!", self.name));
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };
        *self.runtime.lock() = Some(Arc::clone(&runtime));

        for registration in mixins {
            let _ = self.add(&runtime, registration);
        }
        debug!(module = %self.name, registrations = runtime.registry().count(), "module registered");
        Ok(runtime)
    }

    /// Register one more mixin type with an already registered module.
    ///
    /// Instances constructed before this call only pick it up if the host
    /// reports their construction again.
    pub fn register_mixin(&self, registration: impl Into<MixinRegistration>) -> Result<TargetType> {
        let runtime = self.require_runtime("register_mixin")?;
        self.add(&runtime, registration.into())
    }

    fn add(&self, runtime: &ModuleRuntime, registration: MixinRegistration) -> Result<TargetType> {
        let name = registration.mixin.name();
        runtime
            .register_mixin(registration.mixin, registration.refresh_method.as_deref())
            .map_err(|err| {
                self.notifier
                    .report_failure(&format!("{} - failed to register mixin {name}: {err}", self.name));
                err.into()
            })
    }

    /// Start routing hook points to this module.
    pub fn enable(&self) -> Result<()> {
        info!(module = %self.name, "enabling module");
        self.require_runtime("enable")?.set_enabled(true);
        Ok(())
    }

    /// Stop routing hook points to this module. Attached mixins are kept.
    pub fn disable(&self) -> Result<()> {
        info!(module = %self.name, "disabling module");
        self.require_runtime("disable")?.set_enabled(false);
        Ok(())
    }

    /// Whether the module is registered and enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.runtime().is_some_and(|runtime| runtime.is_enabled())
    }

    /// The module runtime, once registered.
    #[must_use]
    pub fn runtime(&self) -> Option<Arc<ModuleRuntime>> {
        self.runtime.lock().clone()
    }

    fn require_runtime(&self, operation: &'static str) -> Result<Arc<ModuleRuntime>> {
        self.runtime().ok_or_else(|| {
            self.notifier
                .report_failure(&format!("Register() method was not called before {operation}()!"));
            ExtenderError::NotRegistered {
                module: self.name.clone(),
                operation,
            }
        })
    }
}

impl fmt::Debug for Extender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extender")
            .field("name", &self.name)
            .field("registered", &self.runtime.lock().is_some())
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}
