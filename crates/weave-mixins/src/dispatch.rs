//! Command dispatch across modules.
//!
//! Decides, for one intercepted command on one target instance, whether a
//! mixin handles it, the target's own body runs, or the call is suppressed.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::{debug, warn};
use weave_core::{InstanceId, ParamKind, Value};

use crate::capability::CommandEntry;
use crate::mixin::{MixinInstance, panic_message};
use crate::runtime::ModuleRuntime;
use crate::target::TargetType;

/// Resolve `command` for `instance` across `modules`, in order.
///
/// Returns `true` if the target's original command body should run and
/// `false` if it must be suppressed. Disabled modules are skipped. Within an
/// enabled module:
///
/// - no mixins and no native command: suppress immediately, without asking
///   later modules;
/// - no mixins but a native command: move on to the next module;
/// - otherwise the first mixin exposing `command` with a matching argument
///   count (or no parameters at all) handles it and the call is suppressed.
///
/// Handler failures are logged and do not change the verdict.
pub fn dispatch(
    modules: &[Arc<ModuleRuntime>],
    target: TargetType,
    instance: InstanceId,
    command: &str,
    args: &[Value],
) -> bool {
    let is_native = target.declares_command(command);

    for module in modules.iter().filter(|module| module.is_enabled()) {
        let Some(mixins) = module.cache().mixins_for(instance) else {
            if is_native {
                continue;
            }
            debug!(module = module.name(), target = %target, command, "no mixins and no native command, suppressed");
            return false;
        };

        for mixin in &mixins {
            let Some(entry) = mixin.capabilities().command(command) else {
                continue;
            };
            if entry.arity() == args.len() {
                let _ = invoke_with_log(module.name(), mixin, entry, coerce_arguments(entry.params(), args));
                return false;
            }
            if entry.arity() == 0 {
                let _ = invoke_with_log(module.name(), mixin, entry, Vec::new());
                return false;
            }
            debug!(
                module = module.name(),
                mixin = mixin.name(),
                command,
                expected = entry.arity(),
                given = args.len(),
                "argument count mismatch, trying next mixin"
            );
        }
    }
    true
}

/// Coerce one positional argument to the handler's declared kind.
///
/// Only text sources are converted: text stays text for a text parameter,
/// parses for numeric parameters, and becomes [`Value::Null`] for anything
/// else or when parsing fails. Other sources pass through unchanged.
#[must_use]
pub fn coerce_argument(value: &Value, kind: ParamKind) -> Value {
    let Value::Text(text) = value else {
        return value.clone();
    };
    match kind {
        ParamKind::Text => value.clone(),
        ParamKind::Int => text.trim().parse::<i32>().map_or_else(
            |err| {
                debug!(value = %text, error = %err, "argument is not an int, passing null");
                Value::Null
            },
            Value::Int,
        ),
        ParamKind::Float => text.trim().parse::<f32>().map_or_else(
            |err| {
                debug!(value = %text, error = %err, "argument is not a float, passing null");
                Value::Null
            },
            Value::Float,
        ),
        ParamKind::Bool | ParamKind::Any => Value::Null,
    }
}

/// Coerce `args` positionally against `params`.
///
/// Arguments beyond the declared parameters pass through unchanged.
#[must_use]
pub fn coerce_arguments(params: &[ParamKind], args: &[Value]) -> Vec<Value> {
    args.iter()
        .enumerate()
        .map(|(index, value)| match params.get(index) {
            Some(kind) => coerce_argument(value, *kind),
            None => value.clone(),
        })
        .collect()
}

/// Invoke a command handler, logging any failure instead of returning it.
///
/// Returns whether the handler completed successfully.
pub(crate) fn invoke_with_log(
    module: &str,
    mixin: &MixinInstance,
    command: &CommandEntry,
    args: Vec<Value>,
) -> bool {
    match catch_unwind(AssertUnwindSafe(|| mixin.invoke(command, args))) {
        Ok(Ok(())) => {
            debug!(module, mixin = mixin.name(), command = command.name(), "mixin handled command");
            true
        }
        Ok(Err(err)) => {
            warn!(module, mixin = mixin.name(), command = command.name(), error = %err, "mixin command failed");
            false
        }
        Err(panic) => {
            warn!(
                module,
                mixin = mixin.name(),
                command = command.name(),
                reason = %panic_message(&*panic),
                "mixin command panicked"
            );
            false
        }
    }
}
