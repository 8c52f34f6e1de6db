/// Sensor staleness detection.
///
/// A tick refreshes `last_updated` only for sensors that advanced without a
/// field fault. When ticks are skipped or a sensor keeps faulting, its
/// displayed values silently go stale; this module lets the presentation
/// layer flag those sensors.
///
/// # Clock injection
/// All functions accept a `now: DateTime<Utc>` parameter rather than calling
/// `Utc::now()` internally. This makes staleness purely deterministic in
/// tests without mocking or time manipulation.

use chrono::{DateTime, Utc};

use crate::model::{MonitoringState, SensorReading};

// ---------------------------------------------------------------------------
// Staleness check
// ---------------------------------------------------------------------------

/// Returns `true` if the reading is older than `max_age_minutes` relative
/// to `now`.
///
/// Staleness is defined as strictly greater than the threshold:
///   age > max_age_minutes  →  stale
///   age == max_age_minutes →  not stale
///
/// A reading timestamped in the future is never stale.
pub fn is_stale_at(reading: &SensorReading, max_age_minutes: u64, now: DateTime<Utc>) -> bool {
    let age_seconds = (now - reading.last_updated).num_seconds();
    age_seconds > 0 && age_seconds as u64 > max_age_minutes.saturating_mul(60)
}

/// Ids of every stale sensor in `state`, in registry order.
pub fn stale_sensors(state: &MonitoringState, max_age_minutes: u64, now: DateTime<Utc>) -> Vec<String> {
    state
        .sensors
        .iter()
        .filter(|s| is_stale_at(s, max_age_minutes, now))
        .map(|s| s.id.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
