/// Station registry for the river monitoring network.
///
/// Defines the canonical list of monitoring sites along the river, with
/// their locations and the baseline readings the simulation is seeded
/// from. This is the single source of truth for sensor ids; all other
/// modules should reference sites from here rather than hardcoding ids.

use crate::model::{GeoPoint, WaterChemistry};

// ---------------------------------------------------------------------------
// Station metadata
// ---------------------------------------------------------------------------

/// Metadata and seed values for a single monitoring site.
pub struct Station {
    /// Sensor id, `SNS-` followed by three digits.
    pub site_id: &'static str,
    pub name: &'static str,
    /// WGS84 latitude.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
    /// Chemistry reported when the simulation starts.
    pub baseline: WaterChemistry,
    pub baseline_waste_level: f64,
    pub baseline_flood_risk: f64,
    pub baseline_species_count: u32,
    pub baseline_diversity_index: f64,
}

impl Station {
    pub fn location(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// All monitored sites, ordered from upstream to downstream.
pub static STATION_REGISTRY: &[Station] = &[
    Station {
        site_id: "SNS-001",
        name: "Upstream Intake",
        latitude: 25.3340,
        longitude: 82.9870,
        baseline: WaterChemistry {
            ph: 7.4,
            dissolved_oxygen_mg_l: 9.2,
            bod_mg_l: 1.8,
            cod_mg_l: 140.0,
            tds_mg_l: 260.0,
            turbidity_ntu: 2.5,
            temperature_c: 23.5,
        },
        baseline_waste_level: 8.0,
        baseline_flood_risk: 18.0,
        baseline_species_count: 24,
        baseline_diversity_index: 0.82,
    },
    Station {
        site_id: "SNS-002",
        name: "Old Bridge",
        latitude: 25.3176,
        longitude: 82.9739,
        baseline: WaterChemistry {
            ph: 7.2,
            dissolved_oxygen_mg_l: 8.5,
            bod_mg_l: 2.1,
            cod_mg_l: 180.0,
            tds_mg_l: 320.0,
            turbidity_ntu: 3.2,
            temperature_c: 24.0,
        },
        baseline_waste_level: 12.0,
        baseline_flood_risk: 15.0,
        baseline_species_count: 18,
        baseline_diversity_index: 0.75,
    },
    Station {
        site_id: "SNS-003",
        name: "Industrial Outfall",
        latitude: 25.2988,
        longitude: 82.9921,
        baseline: WaterChemistry {
            ph: 6.9,
            dissolved_oxygen_mg_l: 6.1,
            bod_mg_l: 4.6,
            cod_mg_l: 240.0,
            tds_mg_l: 430.0,
            turbidity_ntu: 6.8,
            temperature_c: 26.5,
        },
        baseline_waste_level: 42.0,
        baseline_flood_risk: 22.0,
        baseline_species_count: 9,
        baseline_diversity_index: 0.41,
    },
    Station {
        site_id: "SNS-004",
        name: "Ghat Steps",
        latitude: 25.3050,
        longitude: 83.0105,
        baseline: WaterChemistry {
            ph: 7.1,
            dissolved_oxygen_mg_l: 7.4,
            bod_mg_l: 3.0,
            cod_mg_l: 195.0,
            tds_mg_l: 350.0,
            turbidity_ntu: 4.4,
            temperature_c: 25.0,
        },
        baseline_waste_level: 28.0,
        baseline_flood_risk: 30.0,
        baseline_species_count: 14,
        baseline_diversity_index: 0.63,
    },
    Station {
        site_id: "SNS-005",
        name: "Confluence",
        latitude: 25.2841,
        longitude: 83.0290,
        baseline: WaterChemistry {
            ph: 7.6,
            dissolved_oxygen_mg_l: 8.0,
            bod_mg_l: 2.6,
            cod_mg_l: 170.0,
            tds_mg_l: 300.0,
            turbidity_ntu: 5.5,
            temperature_c: 24.5,
        },
        baseline_waste_level: 20.0,
        baseline_flood_risk: 35.0,
        baseline_species_count: 21,
        baseline_diversity_index: 0.71,
    },
    Station {
        site_id: "SNS-006",
        name: "Downstream Wetland",
        latitude: 25.2602,
        longitude: 83.0512,
        baseline: WaterChemistry {
            ph: 7.8,
            dissolved_oxygen_mg_l: 8.8,
            bod_mg_l: 2.0,
            cod_mg_l: 155.0,
            tds_mg_l: 280.0,
            turbidity_ntu: 3.8,
            temperature_c: 23.0,
        },
        baseline_waste_level: 10.0,
        baseline_flood_risk: 25.0,
        baseline_species_count: 27,
        baseline_diversity_index: 0.86,
    },
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
