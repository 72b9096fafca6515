//! Façade error types.

use thiserror::Error;
use weave_mixins::MixinError;

/// Errors returned by [`Extender`](crate::Extender) operations.
#[derive(Debug, Error)]
pub enum ExtenderError {
    /// `enable`, `disable`, or `register_mixin` before `register`.
    #[error("register() was not called for module '{module}' before {operation}()")]
    NotRegistered {
        /// Module name.
        module: String,
        /// The operation attempted.
        operation: &'static str,
    },

    /// Error from the mixin core.
    #[error(transparent)]
    Mixin(#[from] MixinError),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ExtenderError>;
