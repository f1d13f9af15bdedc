//! Transient operator notices.
//!
//! Failures never block the interaction; they surface through this trait and
//! control returns to a consistent state.

use std::sync::Mutex;

/// Sink for transient success/error notices shown to the operator.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Notifier that writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!(notice = "success", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::warn!(notice = "error", "{message}");
    }
}

/// Notifier that records notices for test assertions.
#[derive(Debug, Default)]
pub struct CapturingNotifier {
    successes: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl CapturingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().expect("notifier poisoned").clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().expect("notifier poisoned").clone()
    }
}

impl Notifier for CapturingNotifier {
    fn success(&self, message: &str) {
        self.successes
            .lock()
            .expect("notifier poisoned")
            .push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors
            .lock()
            .expect("notifier poisoned")
            .push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capturing_notifier_records_in_order() {
        let notifier = CapturingNotifier::new();
        notifier.success("created");
        notifier.error("boom");
        notifier.success("updated");

        assert_eq!(notifier.successes(), vec!["created", "updated"]);
        assert_eq!(notifier.errors(), vec!["boom"]);
    }
}
