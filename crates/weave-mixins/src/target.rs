//! Target view models.
//!
//! Targets are host objects weave extends but never owns. A target type is one
//! of a closed set the host declares through [`TargetKind`]; a target instance
//! is referenced only weakly, through [`TargetHandle`] or the instance cache.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;
use weave_core::{InstanceId, Value};

use crate::errors::MixinError;

/// A host view-model instance.
pub trait ViewModel: Send + Sync + 'static {
    /// Stable identity, generated once when the instance is created.
    fn instance_id(&self) -> InstanceId;

    /// Make `accessor` visible to the host's data binding under `name`, as if
    /// it were a native field.
    fn expose_property(&self, name: &str, accessor: PropertyAccessor);
}

/// Static description of a closed view-model type.
pub trait TargetKind: ViewModel + Sized {
    /// Display name.
    const NAME: &'static str;

    /// Commands the type handles natively.
    const NATIVE_COMMANDS: &'static [&'static str] = &[];

    /// Other methods the type declares (refresh hooks bind to these).
    const METHODS: &'static [&'static str] = &[];
}

/// Runtime descriptor of a [`TargetKind`]. Equality and hashing use the
/// type identity only.
#[derive(Clone, Copy)]
pub struct TargetType {
    id: TypeId,
    name: &'static str,
    native_commands: &'static [&'static str],
    methods: &'static [&'static str],
}

impl TargetType {
    /// Descriptor for `T`.
    #[must_use]
    pub fn of<T: TargetKind>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: T::NAME,
            native_commands: T::NATIVE_COMMANDS,
            methods: T::METHODS,
        }
    }

    /// Type identity.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the type handles `command` natively.
    #[must_use]
    pub fn declares_command(&self, command: &str) -> bool {
        self.native_commands.contains(&command)
    }

    /// Whether the type declares a method named `method`. Native commands
    /// count as methods.
    #[must_use]
    pub fn declares_method(&self, method: &str) -> bool {
        self.methods.contains(&method) || self.declares_command(method)
    }
}

impl PartialEq for TargetType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TargetType {}

impl Hash for TargetType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TargetType").field(&self.name).finish()
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Non-owning reference from a mixin to the instance it extends.
///
/// Mixins live in a cache the target does not know about. Holding the target
/// strongly from there would keep it alive forever, so mixins only get this.
pub struct TargetHandle<T> {
    inner: Weak<T>,
    id: InstanceId,
}

impl<T: TargetKind> TargetHandle<T> {
    pub(crate) fn new(target: &Arc<T>) -> Self {
        Self {
            inner: Arc::downgrade(target),
            id: target.instance_id(),
        }
    }

    /// The target, if the host still holds it.
    #[must_use]
    pub fn upgrade(&self) -> Option<Arc<T>> {
        self.inner.upgrade()
    }

    /// Whether the target is still alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Identity of the target, available even after it is dropped.
    #[must_use]
    pub fn instance_id(&self) -> InstanceId {
        self.id
    }
}

impl<T> Clone for TargetHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
            id: self.id,
        }
    }
}

impl<T> fmt::Debug for TargetHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetHandle")
            .field("id", &self.id)
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

type Getter = Arc<dyn Fn() -> Value + Send + Sync>;
type Setter = Arc<dyn Fn(Value) -> Result<(), MixinError> + Send + Sync>;

/// Read (and optionally write) access to one exposed mixin property.
#[derive(Clone)]
pub struct PropertyAccessor {
    name: String,
    getter: Getter,
    setter: Option<Setter>,
}

impl PropertyAccessor {
    /// Read-only accessor.
    pub fn new(name: impl Into<String>, getter: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            getter: Arc::new(getter),
            setter: None,
        }
    }

    /// Add a setter.
    #[must_use]
    pub fn with_setter(
        mut self,
        setter: impl Fn(Value) -> Result<(), MixinError> + Send + Sync + 'static,
    ) -> Self {
        self.setter = Some(Arc::new(setter));
        self
    }

    /// Property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> Value {
        (self.getter)()
    }

    /// Write a value.
    pub fn set(&self, value: Value) -> Result<(), MixinError> {
        match &self.setter {
            Some(setter) => setter(value),
            None => Err(MixinError::ReadOnly {
                name: self.name.clone(),
            }),
        }
    }

    /// Whether [`set`](Self::set) can succeed.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }
}

impl fmt::Debug for PropertyAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyAccessor")
            .field("name", &self.name)
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// Ready-made property store a host view model can embed to implement
/// [`ViewModel::expose_property`]. Keeps exposure order; re-exposing a name
/// replaces the accessor.
#[derive(Default)]
pub struct PropertyTable {
    entries: RwLock<IndexMap<String, PropertyAccessor>>,
}

impl PropertyTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an accessor.
    pub fn insert(&self, name: &str, accessor: PropertyAccessor) {
        let _ = self.entries.write().insert(name.to_owned(), accessor);
    }

    /// Accessor for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<PropertyAccessor> {
        self.entries.read().get(name).cloned()
    }

    /// Current value of `name`, if exposed.
    #[must_use]
    pub fn read(&self, name: &str) -> Option<Value> {
        self.get(name).map(|accessor| accessor.get())
    }

    /// Write `value` to `name`, if exposed.
    pub fn write(&self, name: &str, value: Value) -> Option<Result<(), MixinError>> {
        self.get(name).map(|accessor| accessor.set(value))
    }

    /// Exposed names in exposure order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Number of exposed properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing is exposed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl fmt::Debug for PropertyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyTable")
            .field("names", &self.names())
            .finish()
    }
}
