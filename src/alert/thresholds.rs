//! Safety thresholds and severity tiers.
//!
//! Each alert class has one firing threshold and a set of severity tiers.
//! `clear_band` is an optional dead band: a condition that has fired only
//! clears once the value has moved `clear_band` past the firing threshold.
//! The default of zero clears on the same threshold it fires on.

use serde::{Deserialize, Serialize};

use crate::model::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Alert when pH falls strictly below this value.
    pub ph_low: f64,
    /// pH strictly below this is critical.
    pub ph_critical: f64,
    /// Alert when the waste level rises strictly above this value.
    pub waste_high: f64,
    pub waste_severe: f64,
    pub waste_critical: f64,
    /// Alert when the forecast risk reaches this value.
    pub flood_high: f64,
    pub flood_severe: f64,
    pub flood_critical: f64,
    pub clear_band: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            ph_low: 6.5,
            ph_critical: 6.0,
            waste_high: 50.0,
            waste_severe: 65.0,
            waste_critical: 80.0,
            flood_high: 70.0,
            flood_severe: 75.0,
            flood_critical: 85.0,
            clear_band: 0.0,
        }
    }
}

impl AlertThresholds {
    /// Returns a description of the first misordered or malformed threshold.
    pub fn validate(&self) -> Result<(), String> {
        let values = [
            self.ph_low,
            self.ph_critical,
            self.waste_high,
            self.waste_severe,
            self.waste_critical,
            self.flood_high,
            self.flood_severe,
            self.flood_critical,
            self.clear_band,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err("thresholds must be finite numbers".to_string());
        }
        if self.ph_critical > self.ph_low {
            return Err(format!(
                "ph_critical ({}) must not exceed ph_low ({})",
                self.ph_critical, self.ph_low
            ));
        }
        if !(self.waste_high <= self.waste_severe && self.waste_severe <= self.waste_critical) {
            return Err("waste thresholds must ascend: high <= severe <= critical".to_string());
        }
        if !(self.flood_high <= self.flood_severe && self.flood_severe <= self.flood_critical) {
            return Err("flood thresholds must ascend: high <= severe <= critical".to_string());
        }
        if self.clear_band < 0.0 {
            return Err(format!("clear_band ({}) must not be negative", self.clear_band));
        }
        Ok(())
    }

    // --- pH -----------------------------------------------------------------

    pub fn ph_fires(&self, ph: f64) -> bool {
        ph < self.ph_low
    }

    pub fn ph_clears(&self, ph: f64) -> bool {
        ph >= self.ph_low + self.clear_band
    }

    pub fn ph_severity(&self, ph: f64) -> Severity {
        if ph < self.ph_critical {
            Severity::Critical
        } else {
            Severity::High
        }
    }

    // --- Waste --------------------------------------------------------------

    pub fn waste_fires(&self, level: f64) -> bool {
        level > self.waste_high
    }

    pub fn waste_clears(&self, level: f64) -> bool {
        level <= self.waste_high - self.clear_band
    }

    pub fn waste_severity(&self, level: f64) -> Severity {
        if level > self.waste_critical {
            Severity::Critical
        } else if level > self.waste_severe {
            Severity::High
        } else {
            Severity::Medium
        }
    }

    // --- Flood --------------------------------------------------------------

    pub fn flood_fires(&self, risk: f64) -> bool {
        risk >= self.flood_high
    }

    pub fn flood_clears(&self, risk: f64) -> bool {
        risk < self.flood_high - self.clear_band
    }

    pub fn flood_severity(&self, risk: f64) -> Severity {
        if risk >= self.flood_critical {
            Severity::Critical
        } else if risk >= self.flood_severe {
            Severity::High
        } else {
            Severity::Medium
        }
    }
}
