//! Mixin error types.

use thiserror::Error;
use weave_core::ParamKind;

/// Errors raised by registration, capability access, and handler invocation.
///
/// None of these ever cross the interception boundary: hook entry points log
/// them and report a boolean verdict instead.
#[derive(Debug, Error)]
pub enum MixinError {
    /// The mixin type does not say which target type it extends.
    #[error("failed to find target type for mixin {mixin}, it must declare the view model it extends")]
    UnknownTarget {
        /// Mixin type name.
        mixin: String,
    },

    /// A module with this name is already registered.
    #[error("module '{name}' is already registered")]
    DuplicateModule {
        /// Module name.
        name: String,
    },

    /// No module with this name is registered.
    #[error("module '{name}' is not registered")]
    UnknownModule {
        /// Module name.
        name: String,
    },

    /// An argument could not be handed to a typed handler.
    #[error("argument {index} of '{command}' is not {expected}")]
    Argument {
        /// Command name.
        command: String,
        /// Zero-based argument position.
        index: usize,
        /// Kind the handler declared.
        expected: ParamKind,
    },

    /// The mixin is already executing (re-entrant call).
    #[error("mixin {mixin} is busy")]
    Busy {
        /// Mixin type name.
        mixin: String,
    },

    /// The mixin instance has been reclaimed.
    #[error("mixin {mixin} is no longer alive")]
    Gone {
        /// Mixin type name.
        mixin: String,
    },

    /// Write to a property that exposes no setter.
    #[error("property '{name}' is read-only")]
    ReadOnly {
        /// Property name.
        name: String,
    },

    /// A handler reported failure.
    #[error("{0}")]
    Failed(String),
}

impl MixinError {
    /// Convenience constructor for handler failures.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
