//! Most-recent error message for user-facing display.
//!
//! A new report overwrites any message the UI has not acknowledged yet.
//! Receivers from [`ErrorReporter::watch`] are woken on every change, which
//! is how a toast or alert layer learns there is something to show.

use chrono::Utc;
use orrery_core::types::Timestamp;
use tokio::sync::watch;

/// A message waiting to be shown.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMessage {
    pub message: String,
    pub reported_at: Timestamp,
}

pub struct ErrorReporter {
    sender: watch::Sender<Option<ErrorMessage>>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Replace the current message.
    pub fn report(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(error = %message, "Reporting error to user");
        self.sender.send_replace(Some(ErrorMessage {
            message,
            reported_at: Utc::now(),
        }));
    }

    pub fn current(&self) -> Option<ErrorMessage> {
        self.sender.borrow().clone()
    }

    pub fn current_message(&self) -> Option<String> {
        self.sender.borrow().as_ref().map(|e| e.message.clone())
    }

    /// Clear the current message once the UI has shown it.
    pub fn acknowledge(&self) {
        self.sender.send_if_modified(|current| current.take().is_some());
    }

    pub fn watch(&self) -> watch::Receiver<Option<ErrorMessage>> {
        self.sender.subscribe()
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_without_a_message() {
        let reporter = ErrorReporter::new();
        assert!(reporter.current().is_none());
    }

    #[test]
    fn newest_report_wins() {
        let reporter = ErrorReporter::new();
        reporter.report("first");
        reporter.report("second");
        assert_eq!(reporter.current_message().as_deref(), Some("second"));
    }

    #[test]
    fn acknowledge_clears_and_is_idempotent() {
        let reporter = ErrorReporter::new();
        reporter.report("boom");
        reporter.acknowledge();
        reporter.acknowledge();
        assert!(reporter.current().is_none());
    }

    #[tokio::test]
    async fn watchers_see_reports_and_acknowledgements() {
        let reporter = ErrorReporter::new();
        let mut rx = reporter.watch();

        reporter.report("disk on fire");
        rx.changed().await.expect("sender alive");
        assert_eq!(
            rx.borrow_and_update().as_ref().map(|e| e.message.as_str()),
            Some("disk on fire")
        );

        reporter.acknowledge();
        rx.changed().await.expect("sender alive");
        assert!(rx.borrow_and_update().is_none());
    }
}
