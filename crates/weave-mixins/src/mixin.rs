//! Mixin traits, mixin types, and live mixin instances.
//!
//! A mixin is a module-authored object bound to exactly one target instance.
//! Most mixins implement [`ViewModelMixin`], which names the target type
//! statically. Mixins assembled at run time (from a plugin manifest, a script
//! host, and so on) use [`MixinType::from_factory`] and may not know their
//! target, in which case registration rejects them.

use std::any::{Any, TypeId};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, warn};
use weave_core::{InstanceId, Value};

use crate::capability::{CapabilityBuilder, CapabilityIndex, CommandEntry};
use crate::errors::MixinError;
use crate::target::{PropertyAccessor, TargetHandle, TargetKind, TargetType};

/// Lifecycle hooks every mixin object supports.
pub trait Mixin: Send + 'static {
    /// Called after the target's bound refresh method returns.
    fn on_refresh(&mut self) {}

    /// Called after the target's teardown method returns.
    fn on_finalize(&mut self) {}
}

/// A mixin that statically declares the view model it extends.
pub trait ViewModelMixin: Mixin + Sized {
    /// The target type this mixin extends.
    type Target: TargetKind;

    /// Method on the target after which [`Mixin::on_refresh`] runs.
    /// Ignored if the target does not declare it.
    const REFRESH_METHOD: Option<&'static str> = None;

    /// Construct the mixin for a freshly constructed target.
    fn create(target: TargetHandle<Self::Target>) -> Self;

    /// Declare exposed properties and commands. Called once per instance.
    fn expose(caps: CapabilityBuilder<Self>) -> CapabilityBuilder<Self> {
        caps
    }
}

/// Identity of a mixin type, used to keep one instance per type per target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MixinKey {
    /// Statically typed mixin.
    Type(TypeId),
    /// Factory-built mixin, identified by name.
    Named(&'static str),
}

/// What a factory sees when asked to build a mixin for a new target.
pub struct ConstructContext<'a> {
    instance: &'a dyn Any,
    instance_id: InstanceId,
    target: TargetType,
}

impl<'a> ConstructContext<'a> {
    pub(crate) fn new<T: TargetKind>(instance: &'a Arc<T>) -> Self {
        Self {
            instance,
            instance_id: instance.instance_id(),
            target: TargetType::of::<T>(),
        }
    }

    /// A handle to the target if it is a `T`.
    #[must_use]
    pub fn handle<T: TargetKind>(&self) -> Option<TargetHandle<T>> {
        self.instance
            .downcast_ref::<Arc<T>>()
            .map(TargetHandle::new)
    }

    /// Identity of the target.
    #[must_use]
    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    /// Type of the target.
    #[must_use]
    pub fn target_type(&self) -> TargetType {
        self.target
    }
}

/// A constructed mixin object together with its capability index.
pub struct MixinParts {
    object: Box<dyn ErasedMixin>,
    capabilities: CapabilityIndex,
}

impl MixinParts {
    /// Bundle a mixin with the capabilities it exposes.
    pub fn new<M: Mixin>(mixin: M, capabilities: CapabilityIndex) -> Self {
        Self {
            object: Box::new(mixin),
            capabilities,
        }
    }
}

type Factory = dyn Fn(&ConstructContext<'_>) -> Option<MixinParts> + Send + Sync;

/// A registrable mixin type.
#[derive(Clone)]
pub struct MixinType {
    key: MixinKey,
    name: &'static str,
    target: Option<TargetType>,
    refresh_method: Option<&'static str>,
    factory: Arc<Factory>,
}

impl MixinType {
    /// Mixin type for `M`.
    #[must_use]
    pub fn of<M: ViewModelMixin>() -> Self {
        Self {
            key: MixinKey::Type(TypeId::of::<M>()),
            name: std::any::type_name::<M>(),
            target: Some(TargetType::of::<M::Target>()),
            refresh_method: M::REFRESH_METHOD,
            factory: Arc::new(|ctx: &ConstructContext<'_>| {
                let handle = ctx.handle::<M::Target>()?;
                let mixin = M::create(handle);
                let caps = M::expose(CapabilityBuilder::new()).build();
                Some(MixinParts::new(mixin, caps))
            }),
        }
    }

    /// Mixin type built by an arbitrary factory. `name` is its identity.
    /// A factory returning `None` skips that target instance.
    pub fn from_factory<F>(name: &'static str, target: Option<TargetType>, factory: F) -> Self
    where
        F: Fn(&ConstructContext<'_>) -> Option<MixinParts> + Send + Sync + 'static,
    {
        Self {
            key: MixinKey::Named(name),
            name,
            target,
            refresh_method: None,
            factory: Arc::new(factory),
        }
    }

    /// Set the default refresh method.
    #[must_use]
    pub fn with_refresh_method(mut self, method: &'static str) -> Self {
        self.refresh_method = Some(method);
        self
    }

    /// Identity.
    #[must_use]
    pub fn key(&self) -> MixinKey {
        self.key
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Target type, if the mixin declares one.
    #[must_use]
    pub fn target(&self) -> Option<TargetType> {
        self.target
    }

    /// Default refresh method.
    #[must_use]
    pub fn refresh_method(&self) -> Option<&'static str> {
        self.refresh_method
    }

    pub(crate) fn instantiate(&self, ctx: &ConstructContext<'_>) -> Option<MixinParts> {
        match catch_unwind(AssertUnwindSafe(|| (self.factory)(ctx))) {
            Ok(parts) => parts,
            Err(panic) => {
                warn!(mixin = self.name, reason = %panic_message(&*panic), "mixin construction panicked");
                None
            }
        }
    }
}

impl fmt::Debug for MixinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixinType")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("refresh_method", &self.refresh_method)
            .finish_non_exhaustive()
    }
}

pub(crate) trait ErasedMixin: Send {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn refresh(&mut self);
    fn finalize(&mut self);
}

impl<M: Mixin> ErasedMixin for M {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn refresh(&mut self) {
        self.on_refresh();
    }
    fn finalize(&mut self) {
        self.on_finalize();
    }
}

/// A live mixin bound to one target instance.
///
/// The mixin object is behind its own lock. Every entry point uses
/// `try_lock`, so a handler that re-enters its own mixin gets
/// [`MixinError::Busy`] instead of a deadlock.
pub struct MixinInstance {
    key: MixinKey,
    name: &'static str,
    object: Mutex<Box<dyn ErasedMixin>>,
    capabilities: CapabilityIndex,
}

impl MixinInstance {
    pub(crate) fn new(mixin_type: &MixinType, parts: MixinParts) -> Self {
        Self {
            key: mixin_type.key(),
            name: mixin_type.name(),
            object: Mutex::new(parts.object),
            capabilities: parts.capabilities,
        }
    }

    /// Mixin type identity.
    #[must_use]
    pub fn key(&self) -> MixinKey {
        self.key
    }

    /// Mixin type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Exposed members, fixed at creation.
    #[must_use]
    pub fn capabilities(&self) -> &CapabilityIndex {
        &self.capabilities
    }

    /// Inspect the mixin object as an `M`.
    ///
    /// `None` if it is not an `M` or is busy.
    pub fn with<M: Mixin, R>(&self, f: impl FnOnce(&M) -> R) -> Option<R> {
        let guard = self.object.try_lock()?;
        guard.as_any().downcast_ref::<M>().map(f)
    }

    /// Run a command handler with already-coerced arguments.
    pub fn invoke(&self, command: &CommandEntry, args: Vec<Value>) -> Result<(), MixinError> {
        let mut guard = self.object.try_lock().ok_or_else(|| self.busy())?;
        command.call(guard.as_any_mut(), args)
    }

    pub(crate) fn refresh(&self) {
        self.run_hook("refresh", |mixin| mixin.refresh());
    }

    pub(crate) fn finalize(&self) {
        self.run_hook("finalize", |mixin| mixin.finalize());
    }

    fn run_hook(&self, hook: &'static str, f: impl FnOnce(&mut dyn ErasedMixin)) {
        let Some(mut guard) = self.object.try_lock() else {
            warn!(mixin = self.name, hook, "mixin busy, hook skipped");
            return;
        };
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| f(&mut **guard))) {
            warn!(mixin = self.name, hook, reason = %panic_message(&*panic), "mixin hook panicked");
        }
    }

    /// Build the accessor handed to the host for property `name`.
    ///
    /// The accessor holds the mixin weakly; once the mixin is reclaimed it
    /// reads as [`Value::Null`] and rejects writes.
    pub(crate) fn accessor(self: &Arc<Self>, name: &str) -> Option<PropertyAccessor> {
        let entry = self.capabilities.property(name)?.clone();
        let weak: Weak<Self> = Arc::downgrade(self);
        let mixin_name = self.name;

        let read_entry = entry.clone();
        let read_weak = weak.clone();
        let accessor = PropertyAccessor::new(name, move || {
            let Some(mixin) = read_weak.upgrade() else {
                return Value::Null;
            };
            let Some(guard) = mixin.object.try_lock() else {
                debug!(mixin = mixin_name, property = read_entry.name(), "mixin busy, property read as null");
                return Value::Null;
            };
            read_entry.read(guard.as_any())
        });

        if !entry.is_writable() {
            return Some(accessor);
        }
        Some(accessor.with_setter(move |value| {
            let mixin = weak.upgrade().ok_or_else(|| MixinError::Gone {
                mixin: mixin_name.to_owned(),
            })?;
            let mut guard = mixin.object.try_lock().ok_or_else(|| mixin.busy())?;
            entry.write(guard.as_any_mut(), value)
        }))
    }

    fn busy(&self) -> MixinError {
        MixinError::Busy {
            mixin: self.name.to_owned(),
        }
    }
}

impl fmt::Debug for MixinInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixinInstance")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
