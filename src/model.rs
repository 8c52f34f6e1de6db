/// Core data types for the river monitoring core.
///
/// This module defines the shared domain model imported by all other modules:
/// sensor snapshots, the global flood forecast, the event records kept in
/// capped queues, and the error types raised while simulating, evaluating
/// and notifying. It contains no logic beyond small accessors.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::queue::CappedQueue;

// ---------------------------------------------------------------------------
// Shared enums
// ---------------------------------------------------------------------------

/// WGS84 coordinates of a sensor or event.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Severity of an event or alert, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    /// Whether an alert of this severity warrants a push notification.
    pub fn is_urgent(self) -> bool {
        self >= Severity::High
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Categorical band of a 0–100 health score, in ascending order of health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HealthCategory {
    Critical,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl fmt::Display for HealthCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthCategory::Critical => write!(f, "Critical"),
            HealthCategory::Poor => write!(f, "Poor"),
            HealthCategory::Fair => write!(f, "Fair"),
            HealthCategory::Good => write!(f, "Good"),
            HealthCategory::Excellent => write!(f, "Excellent"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor snapshot
// ---------------------------------------------------------------------------

/// Water chemistry measured at a single sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterChemistry {
    pub ph: f64,
    pub dissolved_oxygen_mg_l: f64,
    pub bod_mg_l: f64,
    pub cod_mg_l: f64,
    pub tds_mg_l: f64,
    pub turbidity_ntu: f64,
    pub temperature_c: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Biodiversity {
    pub species_count: u32,
    /// Shannon-style evenness, normalized to 0–1.
    pub diversity_index: f64,
}

/// The current snapshot of one monitoring sensor.
///
/// Created from the station registry when the simulation is seeded and
/// mutated in place every tick. `status` is derived from the other fields
/// and is never drifted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub id: String,
    pub name: String,
    pub location: GeoPoint,
    pub chemistry: WaterChemistry,
    /// Waste detection level, 0–100.
    pub waste_level: f64,
    /// Local flood risk level, 0–100.
    pub flood_risk: f64,
    pub biodiversity: Biodiversity,
    pub status: HealthCategory,
    pub last_updated: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Flood forecast
// ---------------------------------------------------------------------------

/// The single, basin-wide flood forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodForecast {
    /// Flood risk level, 0–100.
    pub risk_level: f64,
    pub water_level_m: f64,
    pub rainfall_mm: f64,
    pub issued_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Event records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WasteKind {
    Plastic,
    Organic,
    Industrial,
    Mixed,
}

impl WasteKind {
    pub const ALL: [WasteKind; 4] = [
        WasteKind::Plastic,
        WasteKind::Organic,
        WasteKind::Industrial,
        WasteKind::Mixed,
    ];
}

/// A floating-waste detection reported by a camera-equipped sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteDetection {
    pub id: String,
    pub sensor_id: String,
    pub kind: WasteKind,
    pub severity: Severity,
    pub location: GeoPoint,
    pub estimated_volume_m3: f64,
    pub plastic_count: u32,
    pub detected_at: DateTime<Utc>,
}

/// A discrete flood warning issued alongside the forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodAlert {
    pub id: String,
    pub severity: Severity,
    pub location: GeoPoint,
    pub water_level_m: f64,
    pub message: String,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyAlertKind {
    Contamination,
    AlgalBloom,
    ChemicalSpill,
    FlashFlood,
    UnsafeBathing,
}

impl SafetyAlertKind {
    pub const ALL: [SafetyAlertKind; 5] = [
        SafetyAlertKind::Contamination,
        SafetyAlertKind::AlgalBloom,
        SafetyAlertKind::ChemicalSpill,
        SafetyAlertKind::FlashFlood,
        SafetyAlertKind::UnsafeBathing,
    ];
}

impl fmt::Display for SafetyAlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyAlertKind::Contamination => write!(f, "Contamination"),
            SafetyAlertKind::AlgalBloom => write!(f, "Algal bloom"),
            SafetyAlertKind::ChemicalSpill => write!(f, "Chemical spill"),
            SafetyAlertKind::FlashFlood => write!(f, "Flash flood"),
            SafetyAlertKind::UnsafeBathing => write!(f, "Unsafe bathing"),
        }
    }
}

/// A public safety alert published for a stretch of the river.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyAlert {
    pub id: String,
    pub kind: SafetyAlertKind,
    pub severity: Severity,
    pub location: GeoPoint,
    pub description: String,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportCategory {
    IllegalDumping,
    DeadFish,
    Discoloration,
    Odor,
    BankErosion,
}

impl ReportCategory {
    pub const ALL: [ReportCategory; 5] = [
        ReportCategory::IllegalDumping,
        ReportCategory::DeadFish,
        ReportCategory::Discoloration,
        ReportCategory::Odor,
        ReportCategory::BankErosion,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Submitted,
    UnderReview,
    Resolved,
}

/// An observation submitted by a member of the public.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitizenReport {
    pub id: String,
    pub category: ReportCategory,
    pub severity: Severity,
    pub location: GeoPoint,
    pub status: ReportStatus,
    pub reported_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Whole-river state
// ---------------------------------------------------------------------------

/// Everything the simulation owns: sensor snapshots, the forecast and the
/// capped event queues. Written only by the tick path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringState {
    pub tick: u64,
    pub sensors: Vec<SensorReading>,
    pub forecast: FloodForecast,
    pub waste_detections: CappedQueue<WasteDetection>,
    pub flood_alerts: CappedQueue<FloodAlert>,
    pub safety_alerts: CappedQueue<SafetyAlert>,
    pub citizen_reports: CappedQueue<CitizenReport>,
}

impl MonitoringState {
    pub fn sensor(&self, id: &str) -> Option<&SensorReading> {
        self.sensors.iter().find(|s| s.id == id)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A single field failed to advance during a tick. The previous value is kept.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("{field} holds a non-finite value ({value})")]
    NonFinite { field: &'static str, value: f64 },
    #[error("{field} has an invalid interval [{min}, {max}] with step {step}")]
    InvalidBounds {
        field: &'static str,
        min: f64,
        max: f64,
        step: f64,
    },
}

/// A threshold check could not run against the current snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("{check} check: {entity} reports a non-finite value ({value})")]
    NonFinite {
        check: &'static str,
        entity: String,
        value: f64,
    },
}

impl EvaluationError {
    /// The entity whose reading could not be evaluated.
    pub fn entity(&self) -> &str {
        match self {
            EvaluationError::NonFinite { entity, .. } => entity,
        }
    }
}

/// The notifier could not deliver a notification.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),
    #[error("notifier panicked: {0}")]
    Panicked(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering_is_ascending() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_only_high_and_critical_are_urgent() {
        let urgent: Vec<_> = Severity::ALL.iter().filter(|s| s.is_urgent()).collect();
        assert_eq!(urgent, vec![&Severity::High, &Severity::Critical]);
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }

    #[test]
    fn test_health_category_display_matches_band_names() {
        assert_eq!(HealthCategory::Excellent.to_string(), "Excellent");
        assert_eq!(HealthCategory::Critical.to_string(), "Critical");
    }
}
