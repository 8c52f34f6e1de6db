//! Synthesis of new entries for the capped event queues.
//!
//! Each domain rolls independently once per tick. A successful roll
//! produces one entry with randomized kind, severity and location, placed
//! near a randomly chosen sensor.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::model::{
    CitizenReport, FloodAlert, FloodForecast, GeoPoint, ReportCategory, ReportStatus,
    SafetyAlert, SafetyAlertKind, SensorReading, Severity, WasteDetection, WasteKind,
};

/// Largest offset, in degrees, between an event and the sensor it is placed near.
const LOCATION_JITTER_DEG: f64 = 0.002;

/// Per-tick probability of synthesizing one entry for each event queue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRates {
    pub waste: f64,
    pub safety: f64,
    pub citizen: f64,
    pub flood: f64,
}

impl Default for EventRates {
    fn default() -> Self {
        Self {
            waste: 0.10,
            safety: 0.05,
            citizen: 0.03,
            flood: 0.08,
        }
    }
}

impl EventRates {
    /// Returns the name of the first rate outside `[0, 1]`, if any.
    pub fn invalid_rate(&self) -> Option<(&'static str, f64)> {
        [
            ("waste", self.waste),
            ("safety", self.safety),
            ("citizen", self.citizen),
            ("flood", self.flood),
        ]
        .into_iter()
        .find(|(_, p)| !(0.0..=1.0).contains(p))
    }
}

/// Rolls a Bernoulli trial, treating malformed probabilities as "never".
pub fn roll<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    if !(0.0..=1.0).contains(&probability) {
        return false;
    }
    rng.gen_bool(probability)
}

fn jittered<R: Rng + ?Sized>(rng: &mut R, origin: GeoPoint) -> GeoPoint {
    GeoPoint {
        latitude: origin.latitude + rng.gen_range(-LOCATION_JITTER_DEG..=LOCATION_JITTER_DEG),
        longitude: origin.longitude + rng.gen_range(-LOCATION_JITTER_DEG..=LOCATION_JITTER_DEG),
    }
}

fn random_severity<R: Rng + ?Sized>(rng: &mut R) -> Severity {
    Severity::ALL[rng.gen_range(0..Severity::ALL.len())]
}

// ---------------------------------------------------------------------------
// Synthesizers
// ---------------------------------------------------------------------------

/// Returns `None` when there is no sensor to place the detection near.
pub fn synthesize_waste<R: Rng + ?Sized>(
    rng: &mut R,
    id: String,
    sensors: &[SensorReading],
    now: DateTime<Utc>,
) -> Option<WasteDetection> {
    let sensor = sensors.choose(rng)?;
    let kind = *WasteKind::ALL.choose(rng)?;
    let plastic_count = match kind {
        WasteKind::Plastic => rng.gen_range(5..=25),
        WasteKind::Mixed => rng.gen_range(1..=10),
        WasteKind::Organic | WasteKind::Industrial => 0,
    };

    Some(WasteDetection {
        id,
        sensor_id: sensor.id.clone(),
        kind,
        severity: random_severity(rng),
        location: jittered(rng, sensor.location),
        estimated_volume_m3: rng.gen_range(0.1..=3.0),
        plastic_count,
        detected_at: now,
    })
}

pub fn synthesize_flood_alert<R: Rng + ?Sized>(
    rng: &mut R,
    id: String,
    sensors: &[SensorReading],
    forecast: &FloodForecast,
    now: DateTime<Utc>,
) -> Option<FloodAlert> {
    let sensor = sensors.choose(rng)?;
    let severity = random_severity(rng);

    Some(FloodAlert {
        id,
        severity,
        location: jittered(rng, sensor.location),
        water_level_m: forecast.water_level_m,
        message: format!(
            "{} flood warning near {}: water level {:.2} m",
            severity, sensor.name, forecast.water_level_m
        ),
        issued_at: now,
    })
}

pub fn synthesize_safety_alert<R: Rng + ?Sized>(
    rng: &mut R,
    id: String,
    sensors: &[SensorReading],
    now: DateTime<Utc>,
) -> Option<SafetyAlert> {
    let sensor = sensors.choose(rng)?;
    let kind = *SafetyAlertKind::ALL.choose(rng)?;
    let description = match kind {
        SafetyAlertKind::Contamination => "Bacterial contamination above bathing limits",
        SafetyAlertKind::AlgalBloom => "Algal bloom reported; avoid contact with water",
        SafetyAlertKind::ChemicalSpill => "Chemical discharge detected upstream",
        SafetyAlertKind::FlashFlood => "Rapid rise in water level expected",
        SafetyAlertKind::UnsafeBathing => "Strong currents; bathing not advised",
    };

    Some(SafetyAlert {
        id,
        kind,
        severity: random_severity(rng),
        location: jittered(rng, sensor.location),
        description: format!("{} near {}", description, sensor.name),
        issued_at: now,
    })
}

pub fn synthesize_citizen_report<R: Rng + ?Sized>(
    rng: &mut R,
    id: String,
    sensors: &[SensorReading],
    now: DateTime<Utc>,
) -> Option<CitizenReport> {
    let sensor = sensors.choose(rng)?;
    let category = *ReportCategory::ALL.choose(rng)?;

    Some(CitizenReport {
        id,
        category,
        severity: random_severity(rng),
        location: jittered(rng, sensor.location),
        status: ReportStatus::Submitted,
        reported_at: now,
    })
}
