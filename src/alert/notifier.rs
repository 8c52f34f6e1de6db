//! The notifier seam.
//!
//! The evaluator depends only on [`Notifier`]. How a notification reaches a
//! person (local push, remote push, a log line) is the caller's concern.
//! Delivery is fire-and-forget: failures are logged and never roll back
//! the alert-state transition that triggered them.

use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::alert::state::AlertClass;
use crate::logging::{self, Component, FaultKind};
use crate::model::{GeoPoint, NotifyError, Severity};

/// What the alert is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertContext {
    /// Sensor id, safety alert id, or `flood-forecast`.
    pub entity_id: String,
    pub entity_name: Option<String>,
    pub location: Option<GeoPoint>,
    /// The value that crossed the threshold, if the class has one.
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub severity_hint: Severity,
}

pub trait Notifier: Send + Sync {
    fn notify(
        &self,
        class: AlertClass,
        context: &AlertContext,
        notification: &Notification,
    ) -> Result<(), NotifyError>;
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn notify(
        &self,
        class: AlertClass,
        context: &AlertContext,
        notification: &Notification,
    ) -> Result<(), NotifyError> {
        (**self).notify(class, context, notification)
    }
}

/// Writes every notification to the log. The default for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(
        &self,
        class: AlertClass,
        context: &AlertContext,
        notification: &Notification,
    ) -> Result<(), NotifyError> {
        let message = format!(
            "[{}] {}: {} ({})",
            notification.severity_hint, notification.title, notification.body, class
        );
        if notification.severity_hint >= Severity::High {
            logging::warn(Component::Notifier, Some(&context.entity_id), &message);
        } else {
            logging::info(Component::Notifier, Some(&context.entity_id), &message);
        }
        Ok(())
    }
}

/// Calls the notifier, converting both errors and panics into a logged
/// [`NotifyError`]. Never unwinds into the caller.
pub fn deliver(
    notifier: &dyn Notifier,
    class: AlertClass,
    context: &AlertContext,
    notification: &Notification,
) -> Result<(), NotifyError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        notifier.notify(class, context, notification)
    }));

    let result = match outcome {
        Ok(result) => result,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(NotifyError::Panicked(reason))
        }
    };

    if let Err(ref err) = result {
        logging::log_fault(FaultKind::Notifier, &context.entity_id, "notify", err);
    }
    result
}
