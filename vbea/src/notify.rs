//! Notification seam.
//!
//! State transitions surface transient toasts and ask the host to re-render
//! auth-dependent UI. Components emit through this trait so hosts can route
//! notifications however they like.

use tracing::{error, info};

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// Sink for user-visible notifications and UI refresh requests.
pub trait Notifier: Send + Sync {
    /// Surface a transient message to the user.
    fn toast(&self, severity: Severity, message: &str);

    /// Ask the host to re-render state-dependent UI.
    fn refresh_ui(&self) {}
}

/// Default notifier that logs through `tracing`.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn toast(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info | Severity::Success => info!(toast = message),
            Severity::Error => error!(toast = message),
        }
    }
}
