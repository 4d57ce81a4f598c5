//! User-visible notifications.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use tracing::{error, info, warn};

/// How prominently a message should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational.
    Info,
    /// Something degraded but work continued.
    Warning,
    /// An operation failed; the user may retry.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// Sink for messages meant for the user rather than the log.
pub trait Notifier: Send + Sync {
    /// Show `message` with the given severity.
    fn notify(&self, message: &str, severity: Severity);
}

/// Notifier that forwards to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => info!("{message}"),
            Severity::Warning => warn!("{message}"),
            Severity::Error => error!("{message}"),
        }
    }
}

/// Notifier that keeps every message, for hosts that render them later.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    messages: Mutex<Vec<(Severity, String)>>,
}

impl CollectingNotifier {
    /// Empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the collected messages in arrival order.
    pub fn take(&self) -> Vec<(Severity, String)> {
        let mut messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *messages)
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((severity, message.to_owned()));
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, message: &str, severity: Severity) {
        (**self).notify(message, severity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_drains_in_order() {
        let notifier = CollectingNotifier::new();
        notifier.notify("first", Severity::Warning);
        (&notifier).notify("second", Severity::Error);
        assert_eq!(
            notifier.take(),
            [(Severity::Warning, "first".to_owned()), (Severity::Error, "second".to_owned())]
        );
        assert!(notifier.take().is_empty());
    }

    #[test]
    fn severity_orders_by_prominence() {
        assert!(Severity::Error > Severity::Warning);
        assert_eq!(Severity::Info.to_string(), "info");
    }
}
