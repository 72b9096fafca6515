//! Interception call sites.
//!
//! The host (or whatever rewrites its methods) calls these at the matching
//! points of a view model's life. None of them return errors; the only thing
//! the host ever acts on is whether to run a command's original body.

use std::sync::Arc;

use tracing::trace;
use weave_core::{InstanceId, Value};
use weave_mixins::{RuntimeRegistry, TargetKind, TargetType};

/// Entry points for the host's interception hooks.
#[derive(Clone, Debug)]
pub struct Interceptor {
    runtimes: Arc<RuntimeRegistry>,
}

impl Interceptor {
    /// Interceptor routing to `runtimes`.
    #[must_use]
    pub fn new(runtimes: Arc<RuntimeRegistry>) -> Self {
        Self { runtimes }
    }

    /// Interceptor routing to the process-wide registry.
    #[must_use]
    pub fn global() -> Self {
        Self::new(RuntimeRegistry::global())
    }

    /// The registry hooks are routed to.
    #[must_use]
    pub fn runtimes(&self) -> &Arc<RuntimeRegistry> {
        &self.runtimes
    }

    /// End of a target constructor. Returns the number of mixins attached.
    pub fn constructed<T: TargetKind>(&self, instance: &Arc<T>) -> usize {
        trace!(target_type = T::NAME, instance = %instance.instance_id(), "constructed");
        self.runtimes.on_construct(instance)
    }

    /// Start of a command dispatch. Runs `original` and returns its result
    /// unless a mixin handled the command or a module suppressed it.
    pub fn execute_command<T, R>(
        &self,
        instance: &T,
        command: &str,
        args: &[Value],
        original: impl FnOnce() -> R,
    ) -> Option<R>
    where
        T: TargetKind,
    {
        trace!(target_type = T::NAME, instance = %instance.instance_id(), command, "execute command");
        self.runtimes
            .dispatch(TargetType::of::<T>(), instance.instance_id(), command, args)
            .then(original)
    }

    /// End of any target method. Refreshes mixins bound to `method`.
    pub fn method_returned<T: TargetKind>(&self, instance: &T, method: &str) -> usize {
        self.runtimes
            .on_method_returned(TargetType::of::<T>(), instance.instance_id(), method)
    }

    /// End of the target's teardown method.
    pub fn finalized<T: TargetKind>(&self, instance: &T) -> usize {
        self.runtimes.on_teardown(instance.instance_id())
    }

    /// The target is destroyed; drop its mixins now rather than at the next
    /// sweep.
    pub fn dropped(&self, instance: InstanceId) -> usize {
        self.runtimes.on_dropped(instance)
    }
}
