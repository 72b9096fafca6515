//! Mixin instance cache.
//!
//! A side table keyed by [`InstanceId`]. Each entry keeps the target only as
//! a `Weak`, so the cache never extends a target's lifetime; entries whose
//! target is gone are dropped on lookup, on [`MixinInstanceCache::sweep`], or
//! immediately on an explicit removal.

use std::fmt;
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tracing::debug;
use weave_core::InstanceId;

use crate::mixin::{MixinInstance, MixinKey};
use crate::target::{TargetKind, ViewModel};

struct CacheEntry {
    target: Weak<dyn ViewModel>,
    mixins: Vec<Arc<MixinInstance>>,
}

impl CacheEntry {
    fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }
}

/// Per-module store of mixin instances, one list per live target instance.
#[derive(Default)]
pub struct MixinInstanceCache {
    entries: DashMap<InstanceId, CacheEntry>,
}

impl MixinInstanceCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys of the mixins already attached to `instance`, creating an empty
    /// entry on first sight.
    pub fn entry_keys<T: TargetKind>(&self, instance: &Arc<T>) -> Vec<MixinKey> {
        let weak: Weak<T> = Arc::downgrade(instance);
        let entry = self
            .entries
            .entry(instance.instance_id())
            .or_insert_with(|| CacheEntry {
                target: weak,
                mixins: Vec::new(),
            });
        entry.mixins.iter().map(|mixin| mixin.key()).collect()
    }

    /// Append newly created mixins to an existing entry.
    ///
    /// Returns `false` (and drops the mixins) if the entry is gone.
    pub fn append(&self, instance: InstanceId, mixins: Vec<Arc<MixinInstance>>) -> bool {
        match self.entries.get_mut(&instance) {
            Some(mut entry) => {
                entry.mixins.extend(mixins);
                true
            }
            None => false,
        }
    }

    /// Mixins attached to `instance`, in creation order.
    ///
    /// `None` if there is no entry, the entry is empty, or its target has
    /// been dropped (the dead entry is removed).
    #[must_use]
    pub fn mixins_for(&self, instance: InstanceId) -> Option<Vec<Arc<MixinInstance>>> {
        {
            let entry = self.entries.get(&instance)?;
            if entry.is_alive() {
                return (!entry.mixins.is_empty()).then(|| entry.mixins.clone());
            }
        }
        let _ = self.entries.remove(&instance);
        debug!(%instance, "reclaimed mixins of dropped target");
        None
    }

    /// Whether an entry exists for `instance`, dead or alive.
    #[must_use]
    pub fn contains(&self, instance: InstanceId) -> bool {
        self.entries.contains_key(&instance)
    }

    /// Drop the entry for `instance`. Returns whether one existed.
    pub fn remove(&self, instance: InstanceId) -> bool {
        self.entries.remove(&instance).is_some()
    }

    /// Drop every entry whose target is gone. Returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_alive());
        let reclaimed = before.saturating_sub(self.entries.len());
        if reclaimed > 0 {
            debug!(reclaimed, "swept mixin cache");
        }
        reclaimed
    }

    /// Number of entries, including ones not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for MixinInstanceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixinInstanceCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilityIndex;
    use crate::mixin::{Mixin, MixinParts, MixinType};
    use crate::target::{PropertyAccessor, TargetType};

    struct CampVm {
        id: InstanceId,
    }

    impl ViewModel for CampVm {
        fn instance_id(&self) -> InstanceId {
            self.id
        }
        fn expose_property(&self, _name: &str, _accessor: PropertyAccessor) {}
    }

    impl TargetKind for CampVm {
        const NAME: &'static str = "CampVm";
    }

    struct Tent;
    impl Mixin for Tent {}

    fn make_vm() -> Arc<CampVm> {
        Arc::new(CampVm { id: InstanceId::new() })
    }

    fn tent(name: &'static str) -> Arc<MixinInstance> {
        let mixin_type = MixinType::from_factory(name, Some(TargetType::of::<CampVm>()), |_ctx| {
            Some(MixinParts::new(Tent, CapabilityIndex::default()))
        });
        Arc::new(MixinInstance::new(&mixin_type, MixinParts::new(Tent, CapabilityIndex::default())))
    }

    #[test]
    fn entry_created_on_first_sight() {
        let cache = MixinInstanceCache::new();
        let vm = make_vm();
        assert!(cache.entry_keys(&vm).is_empty());
        assert!(cache.contains(vm.id));
        assert_eq!(cache.len(), 1);
        assert!(cache.mixins_for(vm.id).is_none());
    }

    #[test]
    fn appended_mixins_are_listed_in_order() {
        let cache = MixinInstanceCache::new();
        let vm = make_vm();
        let _ = cache.entry_keys(&vm);
        assert!(cache.append(vm.id, vec![tent("a"), tent("b")]));

        let names: Vec<&str> = cache.mixins_for(vm.id).unwrap().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(cache.entry_keys(&vm), vec![MixinKey::Named("a"), MixinKey::Named("b")]);
    }

    #[test]
    fn append_without_entry_is_rejected() {
        let cache = MixinInstanceCache::new();
        assert!(!cache.append(InstanceId::new(), vec![tent("a")]));
        assert!(cache.is_empty());
    }

    #[test]
    fn dead_entry_reclaimed_on_lookup() {
        let cache = MixinInstanceCache::new();
        let vm = make_vm();
        let id = vm.id;
        let _ = cache.entry_keys(&vm);
        let _ = cache.append(id, vec![tent("a")]);
        drop(vm);
        assert!(cache.contains(id));
        assert!(cache.mixins_for(id).is_none());
        assert!(!cache.contains(id));
    }

    #[test]
    fn sweep_drops_only_dead_entries() {
        let cache = MixinInstanceCache::new();
        let alive = make_vm();
        let dead = make_vm();
        let _ = cache.entry_keys(&alive);
        let _ = cache.entry_keys(&dead);
        drop(dead);
        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(alive.id));
        assert_eq!(cache.sweep(), 0);
    }

    #[test]
    fn remove_is_immediate() {
        let cache = MixinInstanceCache::new();
        let vm = make_vm();
        let _ = cache.entry_keys(&vm);
        assert!(cache.remove(vm.id));
        assert!(!cache.remove(vm.id));
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_does_not_keep_mixins_past_target() {
        let cache = MixinInstanceCache::new();
        let vm = make_vm();
        let mixin = tent("a");
        let weak_mixin = Arc::downgrade(&mixin);
        let _ = cache.entry_keys(&vm);
        let _ = cache.append(vm.id, vec![mixin]);
        drop(vm);
        let _ = cache.sweep();
        assert!(weak_mixin.upgrade().is_none());
    }
}
