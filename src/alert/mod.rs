//! Threshold alerting.
//!
//! Submodules:
//! - `thresholds`:  firing thresholds, severity tiers and the clear band.
//! - `state`:       per-class dedup sets and edge transitions.
//! - `notifier`:    the notification seam and a logging implementation.
//! - `evaluator`:   one evaluation pass over the current snapshot.
//! - `stalenesses`: detection of sensors whose readings stopped updating.

pub mod evaluator;
pub mod notifier;
pub mod stalenesses;
pub mod state;
pub mod thresholds;

pub use evaluator::{evaluate, EvaluationReport};
pub use notifier::{AlertContext, LogNotifier, Notification, Notifier};
pub use state::{AlertClass, AlertState, Transition};
pub use thresholds::AlertThresholds;
