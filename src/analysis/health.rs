//! Health assessment of sensors and of the whole river.
//!
//! Builds scoring inputs from the current snapshots. A single sensor is
//! scored from its own fields; the river as a whole is scored from the
//! mean of all sensors, the recent waste detections and the flood forecast.

use crate::analysis::scoring::{
    self, BiodiversityInput, FloodInput, HealthScore, WasteInput, WaterQualityInput,
};
use crate::model::{MonitoringState, SensorReading, WasteKind};

/// Mean dissolved oxygen, in mg/L, below which fish cannot be sustained.
pub const AQUATIC_LIFE_MIN_DO_MG_L: f64 = 5.0;

/// Scores one sensor from its own readings. Used to derive `status`.
pub fn sensor_health(reading: &SensorReading) -> HealthScore {
    scoring::score(
        &WaterQualityInput::from(&reading.chemistry),
        &WasteInput {
            detection_level: Some(reading.waste_level),
            ..Default::default()
        },
        &FloodInput {
            risk_level: Some(reading.flood_risk),
            ..Default::default()
        },
        &BiodiversityInput {
            species_count: Some(reading.biodiversity.species_count),
            diversity_index: Some(reading.biodiversity.diversity_index),
            aquatic_life_present: Some(
                reading.chemistry.dissolved_oxygen_mg_l >= AQUATIC_LIFE_MIN_DO_MG_L,
            ),
        },
    )
}

/// Mean of the finite values produced by `field`, or `None` if there are none.
fn mean<F>(sensors: &[SensorReading], field: F) -> Option<f64>
where
    F: Fn(&SensorReading) -> f64,
{
    let values: Vec<f64> = sensors.iter().map(field).filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Scores the whole river from the current state.
///
/// With no sensors the water and biodiversity domains are neutral and only
/// the forecast and waste detections contribute.
pub fn assess_state(state: &MonitoringState) -> HealthScore {
    let sensors = &state.sensors;

    let water = WaterQualityInput {
        ph: mean(sensors, |s| s.chemistry.ph),
        dissolved_oxygen_mg_l: mean(sensors, |s| s.chemistry.dissolved_oxygen_mg_l),
        bod_mg_l: mean(sensors, |s| s.chemistry.bod_mg_l),
        cod_mg_l: mean(sensors, |s| s.chemistry.cod_mg_l),
        turbidity_ntu: mean(sensors, |s| s.chemistry.turbidity_ntu),
        temperature_c: mean(sensors, |s| s.chemistry.temperature_c),
        tds_mg_l: mean(sensors, |s| s.chemistry.tds_mg_l),
    };

    let detections = &state.waste_detections;
    let waste = WasteInput {
        detection_level: mean(sensors, |s| s.waste_level),
        floating_volume_m3: (!detections.is_empty())
            .then(|| detections.iter().map(|d| d.estimated_volume_m3).sum()),
        plastic_count: (!detections.is_empty()).then(|| {
            detections
                .iter()
                .filter(|d| matches!(d.kind, WasteKind::Plastic | WasteKind::Mixed))
                .map(|d| d.plastic_count)
                .sum()
        }),
    };

    let flood = FloodInput {
        risk_level: Some(state.forecast.risk_level),
        water_level_m: Some(state.forecast.water_level_m),
        rainfall_mm: Some(state.forecast.rainfall_mm),
    };

    let mean_oxygen = mean(sensors, |s| s.chemistry.dissolved_oxygen_mg_l);
    let biodiversity = BiodiversityInput {
        species_count: mean(sensors, |s| f64::from(s.biodiversity.species_count))
            .map(|m| m.round() as u32),
        diversity_index: mean(sensors, |s| s.biodiversity.diversity_index),
        aquatic_life_present: mean_oxygen.map(|m| m >= AQUATIC_LIFE_MIN_DO_MG_L),
    };

    scoring::score(&water, &waste, &flood, &biodiversity)
}
