//! Shared fixtures: a host view model that journals what mixins do to it,
//! and a handful of mixins over it.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use weave_mixins::{
    CapabilityBuilder, InstanceId, Mixin, MixinError, MixinType, ParamKind, PropertyAccessor, PropertyTable,
    RuntimeRegistry, TargetHandle, TargetKind, Value, ViewModel, ViewModelMixin,
};

/// Host view model with one native command and two declared methods.
pub struct MapVm {
    id: InstanceId,
    pub properties: PropertyTable,
    journal: Mutex<Vec<String>>,
}

impl MapVm {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: InstanceId::new(),
            properties: PropertyTable::new(),
            journal: Mutex::new(Vec::new()),
        })
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.journal.lock().push(entry.into());
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().clone()
    }
}

impl ViewModel for MapVm {
    fn instance_id(&self) -> InstanceId {
        self.id
    }

    fn expose_property(&self, name: &str, accessor: PropertyAccessor) {
        self.properties.insert(name, accessor);
    }
}

impl TargetKind for MapVm {
    const NAME: &'static str = "MapVm";
    const NATIVE_COMMANDS: &'static [&'static str] = &["ExecuteClose"];
    const METHODS: &'static [&'static str] = &["RefreshValues", "OnFinalize"];
}

/// A second host type nothing in the fixtures targets by default.
pub struct TavernVm {
    id: InstanceId,
}

impl TavernVm {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { id: InstanceId::new() })
    }
}

impl ViewModel for TavernVm {
    fn instance_id(&self) -> InstanceId {
        self.id
    }

    fn expose_property(&self, _name: &str, _accessor: PropertyAccessor) {}
}

impl TargetKind for TavernVm {
    const NAME: &'static str = "TavernVm";
}

fn journal(target: &TargetHandle<MapVm>, entry: String) {
    if let Some(vm) = target.upgrade() {
        vm.record(entry);
    }
}

/// First selection mixin: refreshes after `RefreshValues`.
pub struct SelectionMixin {
    target: TargetHandle<MapVm>,
    selected: i32,
}

impl Mixin for SelectionMixin {
    fn on_refresh(&mut self) {
        journal(&self.target, "selection:refresh".into());
    }

    fn on_finalize(&mut self) {
        journal(&self.target, "selection:finalize".into());
    }
}

impl ViewModelMixin for SelectionMixin {
    type Target = MapVm;
    const REFRESH_METHOD: Option<&'static str> = Some("RefreshValues");

    fn create(target: TargetHandle<MapVm>) -> Self {
        Self { target, selected: -1 }
    }

    fn expose(caps: CapabilityBuilder<Self>) -> CapabilityBuilder<Self> {
        caps.property_rw(
            "SelectedIndex",
            |m: &Self| m.selected,
            |m: &mut Self, value: Value| {
                m.selected = value
                    .as_int()
                    .ok_or_else(|| MixinError::failed("SelectedIndex takes an int"))?;
                Ok(())
            },
        )
        .command1("ExecuteSelect", |m: &mut Self, index: i32| {
            m.selected = index;
            journal(&m.target, format!("selection:select:{index}"));
        })
        .command("ExecuteMove", &[ParamKind::Int, ParamKind::Int], |m: &mut Self, args| {
            let x = args[0].as_int().unwrap_or_default();
            let y = args[1].as_int().unwrap_or_default();
            journal(&m.target, format!("selection:move:{x},{y}"));
            Ok(())
        })
    }
}

/// Second mixin competing for the same command names.
pub struct MarkerMixin {
    target: TargetHandle<MapVm>,
}

impl Mixin for MarkerMixin {
    fn on_refresh(&mut self) {
        journal(&self.target, "marker:refresh".into());
    }

    fn on_finalize(&mut self) {
        journal(&self.target, "marker:finalize".into());
    }
}

impl ViewModelMixin for MarkerMixin {
    type Target = MapVm;

    fn create(target: TargetHandle<MapVm>) -> Self {
        Self { target }
    }

    fn expose(caps: CapabilityBuilder<Self>) -> CapabilityBuilder<Self> {
        caps.property("MarkerLabel", |_m: &Self| "camp")
            .command1("ExecuteSelect", |m: &mut Self, index: i32| {
                journal(&m.target, format!("marker:select:{index}"));
            })
            .command1("ExecuteMove", |m: &mut Self, x: i32| {
                journal(&m.target, format!("marker:move:{x}"));
            })
            .command0("ExecuteClear", |m: &mut Self| {
                journal(&m.target, "marker:clear".into());
            })
            .command("ExecuteRename", &[ParamKind::Text], |m: &mut Self, args| {
                let name = args[0].as_text().unwrap_or_default().to_owned();
                journal(&m.target, format!("marker:rename:{name}"));
                Ok(())
            })
            .command("ExecuteBreak", &[], |_m: &mut Self, _args| Err(MixinError::failed("marker broke")))
            .command0("ExecutePanic", |_m: &mut Self| panic!("marker panicked"))
    }
}

/// Mixin that takes over the host's native close command.
pub struct CloseMixin {
    target: TargetHandle<MapVm>,
}

impl Mixin for CloseMixin {}

impl ViewModelMixin for CloseMixin {
    type Target = MapVm;

    fn create(target: TargetHandle<MapVm>) -> Self {
        Self { target }
    }

    fn expose(caps: CapabilityBuilder<Self>) -> CapabilityBuilder<Self> {
        caps.command0("ExecuteClose", |m: &mut Self| {
            journal(&m.target, "close:close".into());
        })
    }
}

/// Mixin for the second host type.
pub struct BarMixin;

impl Mixin for BarMixin {}

impl ViewModelMixin for BarMixin {
    type Target = TavernVm;

    fn create(_target: TargetHandle<TavernVm>) -> Self {
        Self
    }

    fn expose(caps: CapabilityBuilder<Self>) -> CapabilityBuilder<Self> {
        caps.command0("ExecuteBuy", |_m: &mut Self| {})
    }
}

/// Registry with one enabled module per `(name, mixins)` pair, in order.
pub fn runtimes_with(modules: Vec<(&str, Vec<MixinType>)>) -> RuntimeRegistry {
    let runtimes = RuntimeRegistry::new();
    for (name, mixins) in modules {
        let module = runtimes.register(name).unwrap();
        for mixin in mixins {
            let _ = module.register_mixin(mixin, None).unwrap();
        }
        runtimes.enable(name).unwrap();
    }
    runtimes
}
