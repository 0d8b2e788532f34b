//! Transient error notifications.

/// Where a notification is anchored on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastPosition {
    #[default]
    BottomCenter,
}

/// Fire-and-forget sink for user-facing error messages.
pub trait NotificationSink {
    fn notify(&self, message: &str, position: ToastPosition);
}

/// Prints notifications to stderr and records them as tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl NotificationSink for StderrNotifier {
    fn notify(&self, message: &str, position: ToastPosition) {
        tracing::debug!(?position, "raising notification");
        eprintln!("error: {message}");
    }
}
