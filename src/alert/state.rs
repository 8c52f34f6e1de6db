//! Edge-trigger state for alerts.
//!
//! Every (entity, alert class) pair is either Clear or Alerted. Membership
//! of an id in its class's dedup set means Alerted. The state is an explicit
//! value owned by the caller and threaded through each evaluation, so any
//! prior state can be constructed directly in tests.
//!
//! Transitions:
//!   Clear   → Alerted  when the condition fires   (notify once)
//!   Alerted → Clear    when the condition clears  (silent, re-arms)
//!   Alerted → Alerted  otherwise                   (never re-notifies)

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertClass {
    PhLow,
    WasteHigh,
    FloodHigh,
    /// Published safety alerts of high or critical severity.
    SafetyCritical,
}

impl AlertClass {
    pub const ALL: [AlertClass; 4] = [
        AlertClass::PhLow,
        AlertClass::WasteHigh,
        AlertClass::FloodHigh,
        AlertClass::SafetyCritical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AlertClass::PhLow => "ph_low",
            AlertClass::WasteHigh => "waste_high",
            AlertClass::FloodHigh => "flood_high",
            AlertClass::SafetyCritical => "safety_critical",
        }
    }
}

impl fmt::Display for AlertClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of observing one (entity, class) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Clear → Alerted. The only transition that notifies.
    Fire,
    /// Alerted → Alerted.
    Hold,
    /// Alerted → Clear.
    Clear,
    /// Clear → Clear.
    Idle,
}

/// One dedup set per alert class. Ephemeral: never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertState {
    ph_low: BTreeSet<String>,
    waste_high: BTreeSet<String>,
    flood_high: BTreeSet<String>,
    safety: BTreeSet<String>,
}

impl AlertState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self, class: AlertClass) -> &BTreeSet<String> {
        match class {
            AlertClass::PhLow => &self.ph_low,
            AlertClass::WasteHigh => &self.waste_high,
            AlertClass::FloodHigh => &self.flood_high,
            AlertClass::SafetyCritical => &self.safety,
        }
    }

    fn ids_mut(&mut self, class: AlertClass) -> &mut BTreeSet<String> {
        match class {
            AlertClass::PhLow => &mut self.ph_low,
            AlertClass::WasteHigh => &mut self.waste_high,
            AlertClass::FloodHigh => &mut self.flood_high,
            AlertClass::SafetyCritical => &mut self.safety,
        }
    }

    pub fn is_alerted(&self, class: AlertClass, id: &str) -> bool {
        self.ids(class).contains(id)
    }

    /// Marks a pair Alerted. Returns `false` if it already was.
    pub fn insert(&mut self, class: AlertClass, id: impl Into<String>) -> bool {
        self.ids_mut(class).insert(id.into())
    }

    /// Marks a pair Clear. Returns `false` if it already was.
    pub fn remove(&mut self, class: AlertClass, id: &str) -> bool {
        self.ids_mut(class).remove(id)
    }

    /// Total number of active alerts across all classes.
    pub fn len(&self) -> usize {
        AlertClass::ALL.iter().map(|c| self.ids(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies one observation of a pair and returns the transition taken.
    ///
    /// `fires` and `clears` come from the class thresholds. Without a dead
    /// band they are complements; with one, a value between the two keeps
    /// the pair in whatever state it is already in.
    pub fn observe(&mut self, class: AlertClass, id: &str, fires: bool, clears: bool) -> Transition {
        if self.is_alerted(class, id) {
            if clears {
                self.remove(class, id);
                Transition::Clear
            } else {
                Transition::Hold
            }
        } else if fires {
            self.insert(class, id);
            Transition::Fire
        } else {
            Transition::Idle
        }
    }

    /// Drops every id of `class` for which `keep` is false and returns them.
    pub fn retain<F>(&mut self, class: AlertClass, mut keep: F) -> Vec<String>
    where
        F: FnMut(&str) -> bool,
    {
        let set = self.ids_mut(class);
        let dropped: Vec<String> = set.iter().filter(|id| !keep(id)).cloned().collect();
        for id in &dropped {
            set.remove(id);
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_crossing_fires_then_holds() {
        let mut state = AlertState::new();
        assert_eq!(state.observe(AlertClass::PhLow, "SNS-001", true, false), Transition::Fire);
        for _ in 0..5 {
            assert_eq!(
                state.observe(AlertClass::PhLow, "SNS-001", true, false),
                Transition::Hold,
                "an alerted pair must never fire again"
            );
        }
        assert!(state.is_alerted(AlertClass::PhLow, "SNS-001"));
    }

    #[test]
    fn test_clear_rearms_the_pair() {
        let mut state = AlertState::new();
        state.observe(AlertClass::WasteHigh, "SNS-003", true, false);
        assert_eq!(state.observe(AlertClass::WasteHigh, "SNS-003", false, true), Transition::Clear);
        assert!(!state.is_alerted(AlertClass::WasteHigh, "SNS-003"));
        assert_eq!(state.observe(AlertClass::WasteHigh, "SNS-003", true, false), Transition::Fire);
    }

    #[test]
    fn test_dead_band_holds_existing_state() {
        let mut state = AlertState::new();
        // Neither firing nor clearing: a Clear pair stays Clear...
        assert_eq!(state.observe(AlertClass::FloodHigh, "f", false, false), Transition::Idle);
        state.insert(AlertClass::FloodHigh, "f");
        // ...and an Alerted pair stays Alerted.
        assert_eq!(state.observe(AlertClass::FloodHigh, "f", false, false), Transition::Hold);
    }

    #[test]
    fn test_classes_are_independent() {
        let mut state = AlertState::new();
        state.insert(AlertClass::PhLow, "SNS-001");
        assert!(!state.is_alerted(AlertClass::WasteHigh, "SNS-001"));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_retain_returns_dropped_ids() {
        let mut state = AlertState::new();
        state.insert(AlertClass::SafetyCritical, "SA-000001");
        state.insert(AlertClass::SafetyCritical, "SA-000002");
        let dropped = state.retain(AlertClass::SafetyCritical, |id| id == "SA-000002");
        assert_eq!(dropped, vec!["SA-000001".to_string()]);
        assert_eq!(state.ids(AlertClass::SafetyCritical).len(), 1);
    }

    #[test]
    fn test_state_round_trips_through_json() {
        let mut state = AlertState::new();
        state.insert(AlertClass::FloodHigh, "flood-forecast");
        let json = serde_json::to_string(&state).unwrap();
        let back: AlertState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
