//! Mixin lifecycle: creation on construct, refresh, and teardown.

use std::sync::Arc;

use tracing::debug;
use weave_core::InstanceId;

use crate::cache::MixinInstanceCache;
use crate::mixin::{ConstructContext, MixinInstance};
use crate::registry::MixinRegistry;
use crate::target::{TargetKind, TargetType};

/// Lifecycle operations for one module, over its registry and cache.
#[derive(Clone, Copy, Debug)]
pub struct Lifecycle<'a> {
    module: &'a str,
    registry: &'a MixinRegistry,
    cache: &'a MixinInstanceCache,
}

impl<'a> Lifecycle<'a> {
    /// Bind a module's registry and cache.
    #[must_use]
    pub fn new(module: &'a str, registry: &'a MixinRegistry, cache: &'a MixinInstanceCache) -> Self {
        Self {
            module,
            registry,
            cache,
        }
    }

    /// Attach every registered mixin type not yet present on `instance`.
    ///
    /// Safe to call more than once per instance: types already attached are
    /// skipped, and only the newly created mixins expose their properties.
    /// Returns the number of mixins created.
    pub fn on_construct<T: TargetKind>(&self, instance: &Arc<T>) -> usize {
        let target = TargetType::of::<T>();
        let id = instance.instance_id();
        let mut present = self.cache.entry_keys(instance);
        let registrations = self.registry.registrations_for(target);
        let ctx = ConstructContext::new(instance);

        let mut created: Vec<Arc<MixinInstance>> = Vec::new();
        for registration in &registrations {
            let mixin_type = registration.mixin();
            let key = mixin_type.key();
            if present.contains(&key) {
                continue;
            }
            present.push(key);

            let Some(parts) = mixin_type.instantiate(&ctx) else {
                debug!(module = self.module, mixin = mixin_type.name(), %id, "mixin declined instance");
                continue;
            };
            created.push(Arc::new(MixinInstance::new(mixin_type, parts)));
        }

        if created.is_empty() {
            return 0;
        }
        let count = created.len();
        let _ = self.cache.append(id, created.clone());

        for mixin in &created {
            for property in mixin.capabilities().property_names() {
                if let Some(accessor) = mixin.accessor(property) {
                    instance.expose_property(property, accessor);
                }
            }
        }
        debug!(module = self.module, target = %target, %id, count, "attached mixins");
        count
    }

    /// Run the refresh hook of every mixin on `instance`, in order.
    pub fn on_refresh(&self, instance: InstanceId) -> usize {
        let Some(mixins) = self.cache.mixins_for(instance) else {
            return 0;
        };
        for mixin in &mixins {
            mixin.refresh();
        }
        mixins.len()
    }

    /// Refresh every mixin on `instance` if any registration of this module
    /// is bound to `method`.
    pub fn on_method_returned(&self, target: TargetType, instance: InstanceId, method: &str) -> usize {
        if !self.registry.is_refresh_bound(target, method) {
            return 0;
        }
        self.on_refresh(instance)
    }

    /// Run the teardown hook of every mixin on `instance`, in order.
    pub fn on_teardown(&self, instance: InstanceId) -> usize {
        let Some(mixins) = self.cache.mixins_for(instance) else {
            return 0;
        };
        for mixin in &mixins {
            mixin.finalize();
        }
        mixins.len()
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use weave_core::Value;

    use super::*;
    use crate::capability::{CapabilityBuilder, CapabilityIndex};
    use crate::mixin::{Mixin, MixinParts, MixinType, ViewModelMixin};
    use crate::target::{PropertyAccessor, PropertyTable, TargetHandle, ViewModel};

    struct PartyVm {
        id: InstanceId,
        properties: PropertyTable,
        exposed: Mutex<Vec<String>>,
    }

    impl ViewModel for PartyVm {
        fn instance_id(&self) -> InstanceId {
            self.id
        }
        fn expose_property(&self, name: &str, accessor: PropertyAccessor) {
            self.exposed.lock().push(name.to_owned());
            self.properties.insert(name, accessor);
        }
    }

    impl TargetKind for PartyVm {
        const NAME: &'static str = "PartyVm";
        const METHODS: &'static [&'static str] = &["RefreshValues", "OnFinalize"];
    }

    struct MoraleMixin {
        morale: i32,
        refreshed: u32,
        finalized: bool,
    }

    impl Mixin for MoraleMixin {
        fn on_refresh(&mut self) {
            self.refreshed += 1;
        }
        fn on_finalize(&mut self) {
            self.finalized = true;
        }
    }

    impl ViewModelMixin for MoraleMixin {
        type Target = PartyVm;
        const REFRESH_METHOD: Option<&'static str> = Some("RefreshValues");

        fn create(_target: TargetHandle<PartyVm>) -> Self {
            Self {
                morale: 50,
                refreshed: 0,
                finalized: false,
            }
        }

        fn expose(caps: CapabilityBuilder<Self>) -> CapabilityBuilder<Self> {
            caps.property("Morale", |m: &Self| m.morale)
        }
    }

    struct SizeMixin {
        refreshed: u32,
    }

    impl Mixin for SizeMixin {
        fn on_refresh(&mut self) {
            self.refreshed += 1;
        }
    }

    impl ViewModelMixin for SizeMixin {
        type Target = PartyVm;

        fn create(_target: TargetHandle<PartyVm>) -> Self {
            Self { refreshed: 0 }
        }

        fn expose(caps: CapabilityBuilder<Self>) -> CapabilityBuilder<Self> {
            caps.property("PartySize", |_m: &Self| 12)
        }
    }

    fn make_vm() -> Arc<PartyVm> {
        Arc::new(PartyVm {
            id: InstanceId::new(),
            properties: PropertyTable::new(),
            exposed: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn construct_attaches_and_exposes() {
        let registry = MixinRegistry::new();
        let cache = MixinInstanceCache::new();
        let _ = registry.register(MixinType::of::<MoraleMixin>(), None).unwrap();
        let _ = registry.register(MixinType::of::<SizeMixin>(), None).unwrap();
        let lifecycle = Lifecycle::new("party", &registry, &cache);

        let vm = make_vm();
        assert_eq!(lifecycle.on_construct(&vm), 2);
        assert_eq!(*vm.exposed.lock(), vec!["Morale", "PartySize"]);
        assert_eq!(vm.properties.read("Morale"), Some(Value::Int(50)));
        assert_eq!(vm.properties.read("PartySize"), Some(Value::Int(12)));
    }

    #[test]
    fn construct_is_idempotent() {
        let registry = MixinRegistry::new();
        let cache = MixinInstanceCache::new();
        let _ = registry.register(MixinType::of::<MoraleMixin>(), None).unwrap();
        let _ = registry.register(MixinType::of::<MoraleMixin>(), None).unwrap();
        let lifecycle = Lifecycle::new("party", &registry, &cache);

        let vm = make_vm();
        assert_eq!(lifecycle.on_construct(&vm), 1);
        assert_eq!(lifecycle.on_construct(&vm), 0);
        assert_eq!(cache.mixins_for(vm.id).unwrap().len(), 1);
        assert_eq!(vm.exposed.lock().len(), 1);
    }

    #[test]
    fn late_registration_applies_on_next_construct() {
        let registry = MixinRegistry::new();
        let cache = MixinInstanceCache::new();
        let _ = registry.register(MixinType::of::<MoraleMixin>(), None).unwrap();
        let lifecycle = Lifecycle::new("party", &registry, &cache);

        let vm = make_vm();
        let _ = lifecycle.on_construct(&vm);
        let _ = registry.register(MixinType::of::<SizeMixin>(), None).unwrap();
        assert_eq!(cache.mixins_for(vm.id).unwrap().len(), 1);

        assert_eq!(lifecycle.on_construct(&vm), 1);
        assert_eq!(cache.mixins_for(vm.id).unwrap().len(), 2);
        assert_eq!(*vm.exposed.lock(), vec!["Morale", "PartySize"]);
    }

    #[test]
    fn declining_factory_is_skipped() {
        let registry = MixinRegistry::new();
        let cache = MixinInstanceCache::new();
        let target = Some(TargetType::of::<PartyVm>());
        let _ = registry
            .register(MixinType::from_factory("never", target, |_ctx| None), None)
            .unwrap();
        let _ = registry
            .register(
                MixinType::from_factory("always", target, |_ctx| {
                    Some(MixinParts::new(SizeMixin { refreshed: 0 }, CapabilityIndex::default()))
                }),
                None,
            )
            .unwrap();
        let lifecycle = Lifecycle::new("party", &registry, &cache);

        let vm = make_vm();
        assert_eq!(lifecycle.on_construct(&vm), 1);
        let mixins = cache.mixins_for(vm.id).unwrap();
        assert_eq!(mixins[0].name(), "always");
    }

    #[test]
    fn refresh_and_teardown_reach_every_mixin() {
        let registry = MixinRegistry::new();
        let cache = MixinInstanceCache::new();
        let _ = registry.register(MixinType::of::<MoraleMixin>(), None).unwrap();
        let _ = registry.register(MixinType::of::<SizeMixin>(), None).unwrap();
        let lifecycle = Lifecycle::new("party", &registry, &cache);

        let vm = make_vm();
        let _ = lifecycle.on_construct(&vm);
        assert_eq!(lifecycle.on_refresh(vm.id), 2);
        assert_eq!(lifecycle.on_teardown(vm.id), 2);

        let mixins = cache.mixins_for(vm.id).unwrap();
        assert_eq!(mixins[0].with(|m: &MoraleMixin| (m.refreshed, m.finalized)), Some((1, true)));
        assert_eq!(mixins[1].with(|m: &SizeMixin| m.refreshed), Some(1));
    }

    #[test]
    fn bound_method_refreshes_every_mixin() {
        let registry = MixinRegistry::new();
        let cache = MixinInstanceCache::new();
        let _ = registry.register(MixinType::of::<MoraleMixin>(), None).unwrap();
        let _ = registry.register(MixinType::of::<SizeMixin>(), None).unwrap();
        let lifecycle = Lifecycle::new("party", &registry, &cache);
        let target = TargetType::of::<PartyVm>();

        let vm = make_vm();
        let _ = lifecycle.on_construct(&vm);
        assert_eq!(lifecycle.on_method_returned(target, vm.id, "RefreshValues"), 2);
        assert_eq!(lifecycle.on_method_returned(target, vm.id, "OnFinalize"), 0);

        let mixins = cache.mixins_for(vm.id).unwrap();
        assert_eq!(mixins[0].with(|m: &MoraleMixin| m.refreshed), Some(1));
        assert_eq!(mixins[1].with(|m: &SizeMixin| m.refreshed), Some(1));
    }

    #[test]
    fn unbound_module_ignores_method_return() {
        let registry = MixinRegistry::new();
        let cache = MixinInstanceCache::new();
        let _ = registry.register(MixinType::of::<SizeMixin>(), None).unwrap();
        let lifecycle = Lifecycle::new("party", &registry, &cache);

        let vm = make_vm();
        let _ = lifecycle.on_construct(&vm);
        assert_eq!(lifecycle.on_method_returned(TargetType::of::<PartyVm>(), vm.id, "RefreshValues"), 0);
        let mixins = cache.mixins_for(vm.id).unwrap();
        assert_eq!(mixins[0].with(|m: &SizeMixin| m.refreshed), Some(0));
    }

    #[test]
    fn hooks_on_unknown_instance_are_noops() {
        let registry = MixinRegistry::new();
        let cache = MixinInstanceCache::new();
        let lifecycle = Lifecycle::new("party", &registry, &cache);
        let id = InstanceId::new();
        assert_eq!(lifecycle.on_refresh(id), 0);
        assert_eq!(lifecycle.on_teardown(id), 0);
        assert_eq!(lifecycle.on_method_returned(TargetType::of::<PartyVm>(), id, "RefreshValues"), 0);
    }
}
