//! User-facing diagnostics.
//!
//! Some failures must reach the person running the host, not just the log:
//! a module loaded twice, or a module driven in the wrong order. The host
//! decides how to show them by supplying a [`UserNotifier`].

use tracing::error;

/// Sink for messages the end user should see.
///
/// With the `test-utils` feature, `MockUserNotifier` is generated for it.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
pub trait UserNotifier: Send + Sync {
    /// Show an error to the user (a popup, an in-game message, ...).
    fn display_user_error(&self, message: &str);

    /// Report a programming error by the module author.
    fn report_failure(&self, message: &str);
}

/// Notifier that only logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl UserNotifier for TracingNotifier {
    fn display_user_error(&self, message: &str) {
        error!(user_visible = true, "{message}");
    }

    fn report_failure(&self, message: &str) {
        error!(user_visible = false, "{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;
    use weave_core::logging::capture_logs;

    #[test]
    fn tracing_notifier_logs_errors() {
        let (logs, _guard) = capture_logs();
        TracingNotifier.display_user_error("module loaded twice");
        TracingNotifier.report_failure("enable before register");

        assert!(logs.has_event(Level::ERROR, "module loaded twice"));
        assert!(logs.has_event(Level::ERROR, "enable before register"));
        assert_eq!(logs.count_at_level(Level::ERROR), 2);
    }

    #[test]
    fn mock_notifier_records_calls() {
        let mut notifier = MockUserNotifier::new();
        notifier
            .expect_display_user_error()
            .withf(|message| message.contains("twice"))
            .times(1)
            .return_const(());
        notifier.display_user_error("loaded twice");
    }
}
