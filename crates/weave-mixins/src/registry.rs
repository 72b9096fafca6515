//! Mixin registry.
//!
//! Maps each target type to the ordered list of mixin types registered for
//! it by one module. Order is registration order; duplicates are kept here
//! and collapsed at instantiation time.

use std::any::TypeId;
use std::fmt;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::errors::MixinError;
use crate::mixin::{MixinKey, MixinType};
use crate::target::TargetType;

/// One registered mixin type.
#[derive(Clone, Debug)]
pub struct Registration {
    mixin: MixinType,
    refresh_method: Option<String>,
}

impl Registration {
    /// The registered mixin type.
    #[must_use]
    pub fn mixin(&self) -> &MixinType {
        &self.mixin
    }

    /// Target method this registration refreshes after, if bound.
    #[must_use]
    pub fn refresh_method(&self) -> Option<&str> {
        self.refresh_method.as_deref()
    }
}

struct TargetRegistrations {
    target: TargetType,
    registrations: Vec<Registration>,
}

/// Per-module registry of mixin types, keyed by target type.
#[derive(Default)]
pub struct MixinRegistry {
    by_target: DashMap<TypeId, TargetRegistrations>,
}

impl MixinRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `mixin` to its target type's list.
    ///
    /// `refresh_method` overrides the mixin type's own default. The binding
    /// is dropped if the target type does not declare that method.
    ///
    /// # Errors
    ///
    /// [`MixinError::UnknownTarget`] if the mixin type does not declare its
    /// target; nothing is registered in that case.
    pub fn register(
        &self,
        mixin: MixinType,
        refresh_method: Option<&str>,
    ) -> Result<TargetType, MixinError> {
        let Some(target) = mixin.target() else {
            warn!(mixin = mixin.name(), "mixin has no target type, registration skipped");
            return Err(MixinError::UnknownTarget {
                mixin: mixin.name().to_owned(),
            });
        };

        let requested = refresh_method.or(mixin.refresh_method());
        let refresh_method = match requested {
            Some(method) if target.declares_method(method) => Some(method.to_owned()),
            Some(method) => {
                debug!(mixin = mixin.name(), target = %target, method, "refresh method not declared on target, not bound");
                None
            }
            None => None,
        };

        debug!(mixin = mixin.name(), target = %target, refresh = ?refresh_method, "registering mixin");
        self.by_target
            .entry(target.id())
            .or_insert_with(|| TargetRegistrations {
                target,
                registrations: Vec::new(),
            })
            .registrations
            .push(Registration {
                mixin,
                refresh_method,
            });
        Ok(target)
    }

    /// Registrations for `target`, in registration order.
    #[must_use]
    pub fn registrations_for(&self, target: TargetType) -> Vec<Registration> {
        self.by_target
            .get(&target.id())
            .map(|entry| entry.registrations.clone())
            .unwrap_or_default()
    }

    /// Whether anything is registered for `target`.
    #[must_use]
    pub fn has_target(&self, target: TargetType) -> bool {
        self.by_target
            .get(&target.id())
            .is_some_and(|entry| !entry.registrations.is_empty())
    }

    /// Target types with at least one registration, sorted by name.
    #[must_use]
    pub fn target_types(&self) -> Vec<TargetType> {
        let mut targets: Vec<TargetType> = self.by_target.iter().map(|entry| entry.target).collect();
        targets.sort_by_key(|target| target.name());
        targets
    }

    /// Whether some registration for `target` refreshes after `method`.
    #[must_use]
    pub fn is_refresh_bound(&self, target: TargetType, method: &str) -> bool {
        !self.refresh_keys(target, method).is_empty()
    }

    /// Mixin types for `target` bound to refresh after `method`.
    #[must_use]
    pub fn refresh_keys(&self, target: TargetType, method: &str) -> Vec<MixinKey> {
        let Some(entry) = self.by_target.get(&target.id()) else {
            return Vec::new();
        };
        let mut keys: Vec<MixinKey> = Vec::new();
        for registration in &entry.registrations {
            let key = registration.mixin.key();
            if registration.refresh_method() == Some(method) && !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    /// Total registrations across all target types.
    #[must_use]
    pub fn count(&self) -> usize {
        self.by_target.iter().map(|entry| entry.registrations.len()).sum()
    }
}

impl fmt::Debug for MixinRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixinRegistry")
            .field("targets", &self.target_types())
            .field("registrations", &self.count())
            .finish()
    }
}
