//! Module runtimes and the registry that routes hook points to them.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::debug;
use weave_core::{InstanceId, Value};
use weave_settings::WeaveSettings;

use crate::cache::MixinInstanceCache;
use crate::dispatch;
use crate::errors::MixinError;
use crate::lifecycle::Lifecycle;
use crate::mixin::MixinType;
use crate::registry::MixinRegistry;
use crate::target::{TargetKind, TargetType};

/// Default number of construct notifications between cache sweeps.
pub const DEFAULT_SWEEP_INTERVAL: u32 = 256;

/// State owned by one extension module.
pub struct ModuleRuntime {
    name: String,
    enabled: AtomicBool,
    registry: MixinRegistry,
    cache: MixinInstanceCache,
    constructs: AtomicU32,
    sweep_interval: u32,
}

impl ModuleRuntime {
    /// A disabled runtime with an empty registry and cache.
    #[must_use]
    pub fn new(name: impl Into<String>, sweep_interval: u32) -> Self {
        Self {
            name: name.into(),
            enabled: AtomicBool::new(false),
            registry: MixinRegistry::new(),
            cache: MixinInstanceCache::new(),
            constructs: AtomicU32::new(0),
            sweep_interval,
        }
    }

    /// Module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether hook points reach this module.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Flip the enabled flag. Registry and cache are untouched.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
        debug!(module = %self.name, enabled, "module toggled");
    }

    /// The module's mixin registry.
    #[must_use]
    pub fn registry(&self) -> &MixinRegistry {
        &self.registry
    }

    /// The module's mixin instance cache.
    #[must_use]
    pub fn cache(&self) -> &MixinInstanceCache {
        &self.cache
    }

    /// Lifecycle operations over this module's registry and cache.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle<'_> {
        Lifecycle::new(&self.name, &self.registry, &self.cache)
    }

    /// Register a mixin type with this module.
    pub fn register_mixin(
        &self,
        mixin: MixinType,
        refresh_method: Option<&str>,
    ) -> Result<TargetType, MixinError> {
        self.registry.register(mixin, refresh_method)
    }

    /// Attach mixins to a new instance and sweep the cache every
    /// `sweep_interval` constructs.
    fn construct<T: TargetKind>(&self, instance: &Arc<T>) -> usize {
        let created = self.lifecycle().on_construct(instance);
        if self.sweep_interval > 0 {
            let seen = self.constructs.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
            if seen % self.sweep_interval == 0 {
                let _ = self.cache.sweep();
            }
        }
        created
    }
}

impl fmt::Debug for ModuleRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRuntime")
            .field("name", &self.name)
            .field("enabled", &self.is_enabled())
            .field("registry", &self.registry)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of module runtimes.
///
/// Hook points are routed to modules in registration order. One process-wide
/// instance is available through [`RuntimeRegistry::global`]; independent
/// instances can be built for embedding and tests.
pub struct RuntimeRegistry {
    modules: RwLock<Vec<Arc<ModuleRuntime>>>,
    enable_on_register: bool,
    sweep_interval: u32,
}

static GLOBAL: OnceLock<Arc<RuntimeRegistry>> = OnceLock::new();

impl RuntimeRegistry {
    /// Empty registry with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            modules: RwLock::new(Vec::new()),
            enable_on_register: false,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Empty registry configured from `settings`.
    #[must_use]
    pub fn from_settings(settings: &WeaveSettings) -> Self {
        Self {
            modules: RwLock::new(Vec::new()),
            enable_on_register: settings.runtime.enable_on_register,
            sweep_interval: settings.cache.sweep_interval,
        }
    }

    /// The process-wide registry, configured from the global settings on
    /// first use.
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::from_settings(weave_settings::get_settings()))))
    }

    /// Create the runtime for module `name`.
    ///
    /// # Errors
    ///
    /// [`MixinError::DuplicateModule`] if the name is taken; the existing
    /// runtime is left as it is.
    pub fn register(&self, name: &str) -> Result<Arc<ModuleRuntime>, MixinError> {
        let mut modules = self.modules.write();
        if modules.iter().any(|module| module.name() == name) {
            return Err(MixinError::DuplicateModule { name: name.to_owned() });
        }
        let runtime = Arc::new(ModuleRuntime::new(name, self.sweep_interval));
        if self.enable_on_register {
            runtime.set_enabled(true);
        }
        modules.push(Arc::clone(&runtime));
        debug!(module = name, enabled = runtime.is_enabled(), "module registered");
        Ok(runtime)
    }

    /// The runtime for module `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<ModuleRuntime>> {
        self.modules.read().iter().find(|module| module.name() == name).cloned()
    }

    /// Snapshot of all runtimes, in registration order.
    #[must_use]
    pub fn modules(&self) -> Vec<Arc<ModuleRuntime>> {
        self.modules.read().clone()
    }

    /// Number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    /// Whether no module is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
    }

    /// Enable module `name`.
    pub fn enable(&self, name: &str) -> Result<(), MixinError> {
        self.toggle(name, true)
    }

    /// Disable module `name`.
    pub fn disable(&self, name: &str) -> Result<(), MixinError> {
        self.toggle(name, false)
    }

    fn toggle(&self, name: &str, enabled: bool) -> Result<(), MixinError> {
        let runtime = self
            .get(name)
            .ok_or_else(|| MixinError::UnknownModule { name: name.to_owned() })?;
        runtime.set_enabled(enabled);
        Ok(())
    }

    fn enabled_modules(&self) -> Vec<Arc<ModuleRuntime>> {
        self.modules
            .read()
            .iter()
            .filter(|module| module.is_enabled())
            .cloned()
            .collect()
    }

    /// Constructor hook: attach mixins from every enabled module with
    /// registrations for `T`. Returns the number of mixins created.
    pub fn on_construct<T: TargetKind>(&self, instance: &Arc<T>) -> usize {
        let target = TargetType::of::<T>();
        self.enabled_modules()
            .iter()
            .filter(|module| module.registry().has_target(target))
            .map(|module| module.construct(instance))
            .sum()
    }

    /// Command hook: `true` if the original command body should run.
    pub fn dispatch(&self, target: TargetType, instance: InstanceId, command: &str, args: &[Value]) -> bool {
        dispatch::dispatch(&self.modules(), target, instance, command, args)
    }

    /// [`dispatch`](Self::dispatch) for a typed instance.
    pub fn dispatch_for<T: TargetKind>(&self, instance: &T, command: &str, args: &[Value]) -> bool {
        self.dispatch(TargetType::of::<T>(), instance.instance_id(), command, args)
    }

    /// Refresh every mixin on `instance` in every enabled module.
    pub fn on_refresh(&self, instance: InstanceId) -> usize {
        self.enabled_modules()
            .iter()
            .map(|module| module.lifecycle().on_refresh(instance))
            .sum()
    }

    /// Method-return hook: each module with a registration bound to
    /// `method` refreshes every mixin it holds for `instance`.
    pub fn on_method_returned(&self, target: TargetType, instance: InstanceId, method: &str) -> usize {
        if !target.declares_method(method) {
            return 0;
        }
        self.enabled_modules()
            .iter()
            .map(|module| module.lifecycle().on_method_returned(target, instance, method))
            .sum()
    }

    /// Teardown hook: finalize every mixin on `instance`.
    pub fn on_teardown(&self, instance: InstanceId) -> usize {
        self.enabled_modules()
            .iter()
            .map(|module| module.lifecycle().on_teardown(instance))
            .sum()
    }

    /// Drop all cached state for `instance` in every module, enabled or not.
    /// Returns the number of entries removed.
    pub fn on_dropped(&self, instance: InstanceId) -> usize {
        let removed = self
            .modules()
            .iter()
            .filter(|module| module.cache().remove(instance))
            .count();
        if removed > 0 {
            debug!(%instance, removed, "instance dropped, mixins reclaimed");
        }
        removed
    }

    /// Sweep dead entries from every module's cache.
    pub fn sweep(&self) -> usize {
        self.modules().iter().map(|module| module.cache().sweep()).sum()
    }
}

impl Default for RuntimeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RuntimeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.modules.read().iter().map(|module| module.name.clone()).collect();
        f.debug_struct("RuntimeRegistry")
            .field("modules", &names)
            .field("enable_on_register", &self.enable_on_register)
            .field("sweep_interval", &self.sweep_interval)
            .finish()
    }
}
