//! Closed intervals and walk steps for every simulated numeric field.
//!
//! The step is a twentieth of the interval width, so a field needs roughly
//! twenty ticks of consistent drift to cross its whole range. The scoring
//! engine normalizes against the same intervals.

/// Number of maximal steps needed to cross a full interval.
pub const STEPS_PER_RANGE: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBounds {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    /// Largest absolute change applied in one tick.
    pub step: f64,
}

impl FieldBounds {
    pub const fn new(name: &'static str, min: f64, max: f64) -> Self {
        Self {
            name,
            min,
            max,
            step: (max - min) / STEPS_PER_RANGE,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min <= self.max
            && self.step.is_finite()
            && self.step >= 0.0
    }
}

// ---------------------------------------------------------------------------
// Sensor fields
// ---------------------------------------------------------------------------

pub const PH: FieldBounds = FieldBounds::new("ph", 6.0, 8.5);
pub const DISSOLVED_OXYGEN: FieldBounds = FieldBounds::new("dissolved_oxygen_mg_l", 4.0, 12.0);
pub const BOD: FieldBounds = FieldBounds::new("bod_mg_l", 1.0, 8.0);
pub const COD: FieldBounds = FieldBounds::new("cod_mg_l", 100.0, 300.0);
pub const TDS: FieldBounds = FieldBounds::new("tds_mg_l", 200.0, 500.0);
pub const TURBIDITY: FieldBounds = FieldBounds::new("turbidity_ntu", 1.0, 10.0);
pub const TEMPERATURE: FieldBounds = FieldBounds::new("temperature_c", 20.0, 30.0);
pub const WASTE_LEVEL: FieldBounds = FieldBounds::new("waste_level", 0.0, 100.0);
pub const FLOOD_RISK: FieldBounds = FieldBounds::new("flood_risk", 0.0, 100.0);
pub const SPECIES_COUNT: FieldBounds = FieldBounds::new("species_count", 5.0, 30.0);
pub const DIVERSITY_INDEX: FieldBounds = FieldBounds::new("diversity_index", 0.0, 1.0);

// ---------------------------------------------------------------------------
// Forecast fields
// ---------------------------------------------------------------------------

pub const FORECAST_RISK: FieldBounds = FieldBounds::new("forecast_risk_level", 0.0, 100.0);
pub const WATER_LEVEL: FieldBounds = FieldBounds::new("water_level_m", 0.5, 8.0);
pub const RAINFALL: FieldBounds = FieldBounds::new("rainfall_mm", 0.0, 100.0);

pub const SENSOR_FIELDS: [FieldBounds; 11] = [
    PH,
    DISSOLVED_OXYGEN,
    BOD,
    COD,
    TDS,
    TURBIDITY,
    TEMPERATURE,
    WASTE_LEVEL,
    FLOOD_RISK,
    SPECIES_COUNT,
    DIVERSITY_INDEX,
];
