//! Capability indexing.
//!
//! A mixin declares what it exposes (data properties and commands) through a
//! [`CapabilityBuilder`] when it is instantiated. The result is an immutable
//! [`CapabilityIndex`]: two name-keyed maps in declaration order.
//!
//! Redeclaring a name replaces the earlier entry (last declaration wins) and
//! keeps its original position.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;
use weave_core::{FromValue, ParamKind, Value};

use crate::errors::MixinError;

pub(crate) type CommandFn =
    Arc<dyn Fn(&mut dyn Any, Vec<Value>) -> Result<(), MixinError> + Send + Sync>;
pub(crate) type GetterFn = Arc<dyn Fn(&dyn Any) -> Value + Send + Sync>;
pub(crate) type SetterFn = Arc<dyn Fn(&mut dyn Any, Value) -> Result<(), MixinError> + Send + Sync>;

/// An exposed command.
#[derive(Clone)]
pub struct CommandEntry {
    name: String,
    params: Vec<ParamKind>,
    handler: CommandFn,
}

impl CommandEntry {
    /// Command name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter kinds, positional.
    #[must_use]
    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    /// Number of declared parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub(crate) fn call(&self, mixin: &mut dyn Any, args: Vec<Value>) -> Result<(), MixinError> {
        (self.handler)(mixin, args)
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// An exposed data property.
#[derive(Clone)]
pub struct PropertyEntry {
    name: String,
    getter: GetterFn,
    setter: Option<SetterFn>,
}

impl PropertyEntry {
    /// Property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the property accepts writes.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    pub(crate) fn read(&self, mixin: &dyn Any) -> Value {
        (self.getter)(mixin)
    }

    pub(crate) fn write(&self, mixin: &mut dyn Any, value: Value) -> Result<(), MixinError> {
        match &self.setter {
            Some(setter) => setter(mixin, value),
            None => Err(MixinError::ReadOnly {
                name: self.name.clone(),
            }),
        }
    }
}

impl fmt::Debug for PropertyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyEntry")
            .field("name", &self.name)
            .field("writable", &self.is_writable())
            .finish_non_exhaustive()
    }
}

/// Name-keyed lookup of one mixin instance's exposed members.
#[derive(Clone, Debug, Default)]
pub struct CapabilityIndex {
    properties: IndexMap<String, PropertyEntry>,
    commands: IndexMap<String, CommandEntry>,
}

impl CapabilityIndex {
    /// Look up a command.
    #[must_use]
    pub fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.commands.get(name)
    }

    /// Look up a property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyEntry> {
        self.properties.get(name)
    }

    /// Commands in declaration order.
    pub fn commands(&self) -> impl Iterator<Item = &CommandEntry> {
        self.commands.values()
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = &PropertyEntry> {
        self.properties.values()
    }

    /// Command names in declaration order.
    #[must_use]
    pub fn command_names(&self) -> Vec<&str> {
        self.commands.keys().map(String::as_str).collect()
    }

    /// Property names in declaration order.
    #[must_use]
    pub fn property_names(&self) -> Vec<&str> {
        self.properties.keys().map(String::as_str).collect()
    }

    /// Whether nothing is exposed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.properties.is_empty()
    }
}

/// Declares the members a mixin of type `M` exposes.
///
/// ```ignore
/// fn expose(caps: CapabilityBuilder<Self>) -> CapabilityBuilder<Self> {
///     caps.property("IsMarked", |m: &Self| m.marked)
///         .command0("ExecuteToggle", |m: &mut Self| m.marked = !m.marked)
///         .command1("ExecuteSelect", |m: &mut Self, index: i32| m.selected = index)
/// }
/// ```
pub struct CapabilityBuilder<M> {
    index: CapabilityIndex,
    _marker: PhantomData<fn(&mut M)>,
}

impl<M: Any + Send> CapabilityBuilder<M> {
    /// Empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            index: CapabilityIndex::default(),
            _marker: PhantomData,
        }
    }

    /// Expose a read-only property.
    #[must_use]
    pub fn property<V, G>(self, name: &str, getter: G) -> Self
    where
        V: Into<Value>,
        G: Fn(&M) -> V + Send + Sync + 'static,
    {
        self.insert_property(name, erase_getter(getter), None)
    }

    /// Expose a property the host may also write.
    #[must_use]
    pub fn property_rw<V, G, S>(self, name: &str, getter: G, setter: S) -> Self
    where
        V: Into<Value>,
        G: Fn(&M) -> V + Send + Sync + 'static,
        S: Fn(&mut M, Value) -> Result<(), MixinError> + Send + Sync + 'static,
    {
        let setter: SetterFn = Arc::new(move |mixin: &mut dyn Any, value| {
            let mixin = downcast_mut::<M>(mixin)?;
            setter(mixin, value)
        });
        self.insert_property(name, erase_getter(getter), Some(setter))
    }

    /// Expose a command with explicit parameter kinds. The handler receives
    /// already-coerced arguments, one per declared parameter.
    #[must_use]
    pub fn command<H>(self, name: &str, params: &[ParamKind], handler: H) -> Self
    where
        H: Fn(&mut M, Vec<Value>) -> Result<(), MixinError> + Send + Sync + 'static,
    {
        let handler: CommandFn = Arc::new(move |mixin: &mut dyn Any, args| {
            let mixin = downcast_mut::<M>(mixin)?;
            handler(mixin, args)
        });
        self.insert_command(name, params.to_vec(), handler)
    }

    /// Expose a command without parameters.
    #[must_use]
    pub fn command0<H>(self, name: &str, handler: H) -> Self
    where
        H: Fn(&mut M) + Send + Sync + 'static,
    {
        self.command(name, &[], move |mixin, _args| {
            handler(mixin);
            Ok(())
        })
    }

    /// Expose a command with one typed parameter.
    #[must_use]
    pub fn command1<A, H>(self, name: &str, handler: H) -> Self
    where
        A: FromValue,
        H: Fn(&mut M, A) + Send + Sync + 'static,
    {
        let command = name.to_owned();
        self.command(name, &[A::KIND], move |mixin, args| {
            let arg = args
                .into_iter()
                .next()
                .and_then(A::from_value)
                .ok_or_else(|| MixinError::Argument {
                    command: command.clone(),
                    index: 0,
                    expected: A::KIND,
                })?;
            handler(mixin, arg);
            Ok(())
        })
    }

    /// Finish the index.
    #[must_use]
    pub fn build(self) -> CapabilityIndex {
        self.index
    }

    fn insert_property(mut self, name: &str, getter: GetterFn, setter: Option<SetterFn>) -> Self {
        let entry = PropertyEntry {
            name: name.to_owned(),
            getter,
            setter,
        };
        if self.index.properties.insert(name.to_owned(), entry).is_some() {
            debug!(property = name, "property redeclared, last declaration wins");
        }
        self
    }

    fn insert_command(mut self, name: &str, params: Vec<ParamKind>, handler: CommandFn) -> Self {
        let entry = CommandEntry {
            name: name.to_owned(),
            params,
            handler,
        };
        if self.index.commands.insert(name.to_owned(), entry).is_some() {
            debug!(command = name, "command redeclared, last declaration wins");
        }
        self
    }
}

impl<M: Any + Send> Default for CapabilityBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

fn erase_getter<M, V, G>(getter: G) -> GetterFn
where
    M: Any,
    V: Into<Value>,
    G: Fn(&M) -> V + Send + Sync + 'static,
{
    Arc::new(move |mixin: &dyn Any| {
        mixin
            .downcast_ref::<M>()
            .map_or(Value::Null, |m| getter(m).into())
    })
}

fn downcast_mut<M: Any>(mixin: &mut dyn Any) -> Result<&mut M, MixinError> {
    mixin
        .downcast_mut::<M>()
        .ok_or_else(|| MixinError::failed(format!("handler bound to {}", std::any::type_name::<M>())))
}
