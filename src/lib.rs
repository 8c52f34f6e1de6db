//! River monitoring core.
//!
//! Simulates a network of river-quality sensors, raises edge-triggered
//! threshold alerts and scores overall river health.
//!
//! - `model`:      shared domain types and error enums.
//! - `queue`:      bounded most-recent-first event lists.
//! - `stations`:   the static sensor registry and its baselines.
//! - `simulation`: bounded random walk and event synthesis per tick.
//! - `analysis`:   composite health scoring.
//! - `alert`:      thresholds, dedup state, evaluation and notification.
//! - `session`:    single-writer owner of the live state.
//! - `scheduler`:  periodic tick driver.
//! - `config`:     TOML and environment configuration.
//! - `logging`:    structured logging on `tracing`.

pub mod alert;
pub mod analysis;
pub mod config;
pub mod logging;
pub mod model;
pub mod queue;
pub mod scheduler;
pub mod session;
pub mod simulation;
pub mod stations;

pub use config::MonitorConfig;
pub use session::{MonitoringSession, TickOutcome, TickSummary};
