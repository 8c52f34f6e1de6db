/// Composite river health scoring.
///
/// Folds four independently normalized sub-scores (water quality, waste,
/// flood, biodiversity), each 0–100, into one weighted overall score with a
/// categorical band. Every function here is pure: identical inputs always
/// give identical outputs.
///
/// Missing inputs never penalize. A parameter that is absent (or not a
/// finite number) is left out of its sub-score, and a sub-score with no
/// usable inputs at all is a neutral 50 where the domain has no natural
/// baseline.

use serde::{Deserialize, Serialize};

use crate::model::{HealthCategory, WaterChemistry};
use crate::simulation::bounds;

// ---------------------------------------------------------------------------
// Weights and normalization constants
// ---------------------------------------------------------------------------

pub const WATER_WEIGHT: f64 = 0.40;
pub const WASTE_WEIGHT: f64 = 0.25;
pub const FLOOD_WEIGHT: f64 = 0.20;
pub const BIODIVERSITY_WEIGHT: f64 = 0.15;

/// Sub-score returned when a domain has no usable inputs.
pub const NEUTRAL_SCORE: f64 = 50.0;

const WASTE_LEVEL_PENALTY: f64 = 50.0;
const WASTE_VOLUME_PENALTY: f64 = 30.0;
const WASTE_PLASTIC_PENALTY: f64 = 20.0;
/// Floating volume, in m³, at which the volume penalty saturates.
const WASTE_VOLUME_SATURATION_M3: f64 = 10.0;
const WASTE_PLASTIC_SATURATION: f64 = 50.0;

const FLOOD_RISK_PENALTY: f64 = 60.0;
const FLOOD_LEVEL_PENALTY: f64 = 25.0;
const FLOOD_RAIN_PENALTY: f64 = 15.0;
/// Normal water level at the reference gauge, in metres.
pub const NOMINAL_WATER_LEVEL_M: f64 = 2.5;
const WATER_LEVEL_DEVIATION_SATURATION_M: f64 = 3.0;
const RAINFALL_SATURATION_MM: f64 = 100.0;

const SPECIES_POINTS: f64 = 40.0;
const DIVERSITY_POINTS: f64 = 40.0;
const AQUATIC_LIFE_POINTS: f64 = 20.0;
/// Species count that earns full species points.
const SPECIES_REFERENCE_COUNT: f64 = 25.0;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterQualityInput {
    pub ph: Option<f64>,
    pub dissolved_oxygen_mg_l: Option<f64>,
    pub bod_mg_l: Option<f64>,
    pub cod_mg_l: Option<f64>,
    pub turbidity_ntu: Option<f64>,
    pub temperature_c: Option<f64>,
    pub tds_mg_l: Option<f64>,
}

impl From<&WaterChemistry> for WaterQualityInput {
    fn from(chem: &WaterChemistry) -> Self {
        Self {
            ph: Some(chem.ph),
            dissolved_oxygen_mg_l: Some(chem.dissolved_oxygen_mg_l),
            bod_mg_l: Some(chem.bod_mg_l),
            cod_mg_l: Some(chem.cod_mg_l),
            turbidity_ntu: Some(chem.turbidity_ntu),
            temperature_c: Some(chem.temperature_c),
            tds_mg_l: Some(chem.tds_mg_l),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WasteInput {
    /// Detection level, 0–100.
    pub detection_level: Option<f64>,
    pub floating_volume_m3: Option<f64>,
    pub plastic_count: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FloodInput {
    /// Risk level, 0–100.
    pub risk_level: Option<f64>,
    pub water_level_m: Option<f64>,
    pub rainfall_mm: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BiodiversityInput {
    pub species_count: Option<u32>,
    /// Diversity index, 0–1.
    pub diversity_index: Option<f64>,
    pub aquatic_life_present: Option<bool>,
}

/// Derived, never stored. Recompute from the current snapshots on demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    pub overall: u8,
    pub category: HealthCategory,
    pub water: f64,
    pub waste: f64,
    pub flood: f64,
    pub biodiversity: f64,
}

// ---------------------------------------------------------------------------
// Water quality
// ---------------------------------------------------------------------------

/// Range over which a parameter scores.
///
/// Full marks between `optimal_low` and `optimal_high`, decaying linearly to
/// zero at `low_edge` / `high_edge`. Infinite edges mean "no penalty on
/// that side".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimalBand {
    pub low_edge: f64,
    pub optimal_low: f64,
    pub optimal_high: f64,
    pub high_edge: f64,
}

impl OptimalBand {
    /// Partial score 0–100 for `value`.
    pub fn score(&self, value: f64) -> f64 {
        let raw = if value < self.optimal_low {
            100.0 * (value - self.low_edge) / (self.optimal_low - self.low_edge)
        } else if value > self.optimal_high {
            100.0 * (self.high_edge - value) / (self.high_edge - self.optimal_high)
        } else {
            100.0
        };
        raw.clamp(0.0, 100.0)
    }
}

/// pH peaks at the midpoint of its interval and reaches zero at both edges.
pub const PH_BAND: OptimalBand = OptimalBand {
    low_edge: bounds::PH.min,
    optimal_low: (bounds::PH.min + bounds::PH.max) / 2.0,
    optimal_high: (bounds::PH.min + bounds::PH.max) / 2.0,
    high_edge: bounds::PH.max,
};
pub const DISSOLVED_OXYGEN_BAND: OptimalBand = OptimalBand {
    low_edge: bounds::DISSOLVED_OXYGEN.min,
    optimal_low: 8.0,
    optimal_high: f64::INFINITY,
    high_edge: f64::INFINITY,
};
pub const BOD_BAND: OptimalBand = OptimalBand {
    low_edge: f64::NEG_INFINITY,
    optimal_low: f64::NEG_INFINITY,
    optimal_high: 3.0,
    high_edge: bounds::BOD.max,
};
pub const COD_BAND: OptimalBand = OptimalBand {
    low_edge: f64::NEG_INFINITY,
    optimal_low: f64::NEG_INFINITY,
    optimal_high: 150.0,
    high_edge: bounds::COD.max,
};
pub const TURBIDITY_BAND: OptimalBand = OptimalBand {
    low_edge: f64::NEG_INFINITY,
    optimal_low: f64::NEG_INFINITY,
    optimal_high: 5.0,
    high_edge: bounds::TURBIDITY.max,
};
pub const TEMPERATURE_BAND: OptimalBand = OptimalBand {
    low_edge: bounds::TEMPERATURE.min,
    optimal_low: 22.0,
    optimal_high: 26.0,
    high_edge: bounds::TEMPERATURE.max,
};
pub const TDS_BAND: OptimalBand = OptimalBand {
    low_edge: f64::NEG_INFINITY,
    optimal_low: f64::NEG_INFINITY,
    optimal_high: 300.0,
    high_edge: bounds::TDS.max,
};

/// Weighted average of the partial scores of every present parameter.
pub fn water_quality_score(input: &WaterQualityInput) -> f64 {
    let parameters = [
        (input.ph, PH_BAND, 0.20),
        (input.dissolved_oxygen_mg_l, DISSOLVED_OXYGEN_BAND, 0.20),
        (input.bod_mg_l, BOD_BAND, 0.15),
        (input.turbidity_ntu, TURBIDITY_BAND, 0.15),
        (input.cod_mg_l, COD_BAND, 0.10),
        (input.temperature_c, TEMPERATURE_BAND, 0.10),
        (input.tds_mg_l, TDS_BAND, 0.10),
    ];

    let (earned, weight) = parameters
        .iter()
        .filter_map(|(value, band, weight)| {
            value
                .filter(|v| v.is_finite())
                .map(|v| (band.score(v) * weight, *weight))
        })
        .fold((0.0, 0.0), |(earned, total), (e, w)| (earned + e, total + w));

    if weight == 0.0 {
        NEUTRAL_SCORE
    } else {
        earned / weight
    }
}

// ---------------------------------------------------------------------------
// Waste, flood, biodiversity
// ---------------------------------------------------------------------------

fn ratio(value: f64, saturation: f64) -> f64 {
    if value.is_finite() {
        (value / saturation).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

pub fn waste_score(input: &WasteInput) -> f64 {
    let level = input.detection_level.map_or(0.0, |v| ratio(v, 100.0)) * WASTE_LEVEL_PENALTY;
    let volume = input
        .floating_volume_m3
        .map_or(0.0, |v| ratio(v, WASTE_VOLUME_SATURATION_M3))
        * WASTE_VOLUME_PENALTY;
    let plastic = input
        .plastic_count
        .map_or(0.0, |c| ratio(f64::from(c), WASTE_PLASTIC_SATURATION))
        * WASTE_PLASTIC_PENALTY;

    (100.0 - level - volume - plastic).max(0.0)
}

pub fn flood_score(input: &FloodInput) -> f64 {
    let risk = input.risk_level.map_or(0.0, |v| ratio(v, 100.0)) * FLOOD_RISK_PENALTY;
    let deviation = input
        .water_level_m
        .map_or(0.0, |level| {
            ratio((level - NOMINAL_WATER_LEVEL_M).abs(), WATER_LEVEL_DEVIATION_SATURATION_M)
        })
        * FLOOD_LEVEL_PENALTY;
    let rain = input
        .rainfall_mm
        .map_or(0.0, |v| ratio(v, RAINFALL_SATURATION_MM))
        * FLOOD_RAIN_PENALTY;

    (100.0 - risk - deviation - rain).max(0.0)
}

/// Additive points: species up to 40, diversity up to 40, aquatic life 20.
/// A missing component earns nothing; only a fully empty input is neutral.
pub fn biodiversity_score(input: &BiodiversityInput) -> f64 {
    let diversity = input.diversity_index.filter(|v| v.is_finite());
    if input.species_count.is_none() && diversity.is_none() && input.aquatic_life_present.is_none() {
        return NEUTRAL_SCORE;
    }

    let species = input
        .species_count
        .map_or(0.0, |count| ratio(f64::from(count), SPECIES_REFERENCE_COUNT) * SPECIES_POINTS);
    let diversity = diversity.map_or(0.0, |index| index.clamp(0.0, 1.0) * DIVERSITY_POINTS);
    let aquatic = match input.aquatic_life_present {
        Some(true) => AQUATIC_LIFE_POINTS,
        _ => 0.0,
    };

    (species + diversity + aquatic).clamp(0.0, 100.0)
}

// ---------------------------------------------------------------------------
// Overall score
// ---------------------------------------------------------------------------

/// Maps an overall score to its band. Lower bounds are inclusive.
pub fn categorize(score: u8) -> HealthCategory {
    match score {
        80..=u8::MAX => HealthCategory::Excellent,
        60..=79 => HealthCategory::Good,
        40..=59 => HealthCategory::Fair,
        20..=39 => HealthCategory::Poor,
        _ => HealthCategory::Critical,
    }
}

pub fn score(
    water: &WaterQualityInput,
    waste: &WasteInput,
    flood: &FloodInput,
    biodiversity: &BiodiversityInput,
) -> HealthScore {
    let water = water_quality_score(water);
    let waste = waste_score(waste);
    let flood = flood_score(flood);
    let biodiversity = biodiversity_score(biodiversity);

    let weighted = WATER_WEIGHT * water
        + WASTE_WEIGHT * waste
        + FLOOD_WEIGHT * flood
        + BIODIVERSITY_WEIGHT * biodiversity;
    let overall = weighted.round().clamp(0.0, 100.0) as u8;

    HealthScore {
        overall,
        category: categorize(overall),
        water,
        waste,
        flood,
        biodiversity,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
