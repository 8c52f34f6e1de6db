/// River health analysis.
///
/// Submodules:
/// - `scoring`: the pure composite scoring engine and category bands.
/// - `health`:  builds scoring inputs from sensor and river snapshots.

pub mod health;
pub mod scoring;

pub use health::{assess_state, sensor_health};
pub use scoring::{categorize, score, HealthScore};
