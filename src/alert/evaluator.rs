//! One evaluation pass of the alert state machine.
//!
//! A pass runs four checks (pH, waste, flood, safety) against the current
//! snapshot. Every entity is read and validated before the alert state is
//! touched. An entity whose reading is not finite faults on its own: its
//! alert state is left exactly as it was, and the rest of the check and the
//! other checks carry on.

use serde::Serialize;

use crate::alert::notifier::{self, AlertContext, Notification, Notifier};
use crate::alert::state::{AlertClass, AlertState, Transition};
use crate::alert::thresholds::AlertThresholds;
use crate::logging::{self, Component, FaultKind};
use crate::model::{EvaluationError, MonitoringState};
use crate::simulation::engine::FORECAST_ENTITY;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmittedAlert {
    pub class: AlertClass,
    pub context: AlertContext,
    pub notification: Notification,
    /// `false` if the notifier failed. The alert still counts as fired.
    pub delivered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClearedAlert {
    pub class: AlertClass,
    pub entity_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckFault {
    pub class: AlertClass,
    pub error: EvaluationError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationReport {
    pub emitted: Vec<EmittedAlert>,
    pub cleared: Vec<ClearedAlert>,
    pub faults: Vec<CheckFault>,
}

impl EvaluationReport {
    pub fn emitted_for(&self, class: AlertClass) -> impl Iterator<Item = &EmittedAlert> {
        self.emitted.iter().filter(move |a| a.class == class)
    }
}

// ---------------------------------------------------------------------------
// Observations
// ---------------------------------------------------------------------------

/// What a check concluded about one entity, before any state change.
struct Observation {
    entity_id: String,
    fires: bool,
    clears: bool,
    context: AlertContext,
    notification: Notification,
}

fn finite(check: &'static str, entity: &str, value: f64) -> Result<f64, EvaluationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvaluationError::NonFinite {
            check,
            entity: entity.to_string(),
            value,
        })
    }
}

/// Per-entity result of a check.
type Outcome = Result<Observation, EvaluationError>;

fn check_ph(state: &MonitoringState, thresholds: &AlertThresholds) -> Vec<Outcome> {
    state
        .sensors
        .iter()
        .map(|sensor| {
            let ph = finite("ph", &sensor.id, sensor.chemistry.ph)?;
            Ok(Observation {
                entity_id: sensor.id.clone(),
                fires: thresholds.ph_fires(ph),
                clears: thresholds.ph_clears(ph),
                context: AlertContext {
                    entity_id: sensor.id.clone(),
                    entity_name: Some(sensor.name.clone()),
                    location: Some(sensor.location),
                    value: Some(ph),
                },
                notification: Notification {
                    title: format!("Low pH at {}", sensor.name),
                    body: format!(
                        "pH dropped to {:.2}, below the safe minimum of {:.1}.",
                        ph, thresholds.ph_low
                    ),
                    severity_hint: thresholds.ph_severity(ph),
                },
            })
        })
        .collect()
}

fn check_waste(state: &MonitoringState, thresholds: &AlertThresholds) -> Vec<Outcome> {
    state
        .sensors
        .iter()
        .map(|sensor| {
            let level = finite("waste", &sensor.id, sensor.waste_level)?;
            Ok(Observation {
                entity_id: sensor.id.clone(),
                fires: thresholds.waste_fires(level),
                clears: thresholds.waste_clears(level),
                context: AlertContext {
                    entity_id: sensor.id.clone(),
                    entity_name: Some(sensor.name.clone()),
                    location: Some(sensor.location),
                    value: Some(level),
                },
                notification: Notification {
                    title: format!("High waste at {}", sensor.name),
                    body: format!(
                        "Waste detection level is {:.0}, above the limit of {:.0}.",
                        level, thresholds.waste_high
                    ),
                    severity_hint: thresholds.waste_severity(level),
                },
            })
        })
        .collect()
}

/// The forecast is basin-wide, so flood risk is one entity, not one per sensor.
fn check_flood(state: &MonitoringState, thresholds: &AlertThresholds) -> Vec<Outcome> {
    let forecast = &state.forecast;
    let risk = match finite("flood", FORECAST_ENTITY, forecast.risk_level) {
        Ok(risk) => risk,
        Err(error) => return vec![Err(error)],
    };
    vec![Ok(Observation {
        entity_id: FORECAST_ENTITY.to_string(),
        fires: thresholds.flood_fires(risk),
        clears: thresholds.flood_clears(risk),
        context: AlertContext {
            entity_id: FORECAST_ENTITY.to_string(),
            entity_name: None,
            location: None,
            value: Some(risk),
        },
        notification: Notification {
            title: "Flood risk rising".to_string(),
            body: format!(
                "Forecast flood risk is {:.0}% with the river at {:.2} m.",
                risk, forecast.water_level_m
            ),
            severity_hint: thresholds.flood_severity(risk),
        },
    })]
}

/// Safety alerts carry their own ids and never clear by value; they leave
/// the dedup set only when they drop out of the published list.
fn check_safety(state: &MonitoringState) -> Vec<Outcome> {
    state
        .safety_alerts
        .iter()
        .map(|alert| {
            Ok(Observation {
                entity_id: alert.id.clone(),
                fires: alert.severity.is_urgent(),
                clears: false,
                context: AlertContext {
                    entity_id: alert.id.clone(),
                    entity_name: None,
                    location: Some(alert.location),
                    value: None,
                },
                notification: Notification {
                    title: format!("{} alert", alert.kind),
                    body: alert.description.clone(),
                    severity_hint: alert.severity,
                },
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Evaluation pass
// ---------------------------------------------------------------------------

/// Runs one evaluation pass, updating `alerts` in place and invoking
/// `notifier` once for every Clear → Alerted transition.
pub fn evaluate(
    state: &MonitoringState,
    alerts: &mut AlertState,
    thresholds: &AlertThresholds,
    notifier: &dyn Notifier,
) -> EvaluationReport {
    let mut report = EvaluationReport::default();

    let checks: [(AlertClass, Vec<Outcome>); 4] = [
        (AlertClass::PhLow, check_ph(state, thresholds)),
        (AlertClass::WasteHigh, check_waste(state, thresholds)),
        (AlertClass::FloodHigh, check_flood(state, thresholds)),
        (AlertClass::SafetyCritical, check_safety(state)),
    ];

    for (class, outcomes) in checks {
        apply(class, outcomes, alerts, notifier, &mut report);
    }

    report
}

fn apply(
    class: AlertClass,
    outcomes: Vec<Outcome>,
    alerts: &mut AlertState,
    notifier: &dyn Notifier,
    report: &mut EvaluationReport,
) {
    // Faulted entities still count as present so their alerts survive GC.
    let present: Vec<String> = outcomes
        .iter()
        .map(|outcome| match outcome {
            Ok(observation) => observation.entity_id.clone(),
            Err(error) => error.entity().to_string(),
        })
        .collect();

    for outcome in outcomes {
        let observation = match outcome {
            Ok(observation) => observation,
            Err(error) => {
                logging::log_fault(FaultKind::Evaluation, error.entity(), class.as_str(), &error);
                report.faults.push(CheckFault { class, error });
                continue;
            }
        };

        match alerts.observe(class, &observation.entity_id, observation.fires, observation.clears) {
            Transition::Fire => {
                let delivered = notifier::deliver(
                    notifier,
                    class,
                    &observation.context,
                    &observation.notification,
                )
                .is_ok();
                report.emitted.push(EmittedAlert {
                    class,
                    context: observation.context,
                    notification: observation.notification,
                    delivered,
                });
            }
            Transition::Clear => {
                logging::debug(
                    Component::Alerts,
                    Some(&observation.entity_id),
                    &format!("{} cleared", class),
                );
                report.cleared.push(ClearedAlert {
                    class,
                    entity_id: observation.entity_id,
                });
            }
            Transition::Hold | Transition::Idle => {}
        }
    }

    // Entities that vanished from the snapshot (superseded safety alerts,
    // removed sensors) are garbage-collected silently.
    for entity_id in alerts.retain(class, |id| present.iter().any(|p| p == id)) {
        logging::debug(Component::Alerts, Some(&entity_id), &format!("{} released", class));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GeoPoint, NotifyError, SafetyAlert, SafetyAlertKind, Severity};
    use crate::simulation::engine::seed_state;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(AlertClass, String, Severity)>>,
    }

    impl Recorder {
        fn count(&self, class: AlertClass) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| c.0 == class).count()
        }
    }

    impl Notifier for Recorder {
        fn notify(
            &self,
            class: AlertClass,
            context: &AlertContext,
            notification: &Notification,
        ) -> Result<(), NotifyError> {
            self.calls.lock().unwrap().push((
                class,
                context.entity_id.clone(),
                notification.severity_hint,
            ));
            Ok(())
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 6, 0, 0).unwrap()
    }

    fn quiet_state() -> MonitoringState {
        seed_state(fixed_now(), 20)
    }

    fn safety(id: &str, severity: Severity) -> SafetyAlert {
        SafetyAlert {
            id: id.to_string(),
            kind: SafetyAlertKind::ChemicalSpill,
            severity,
            location: GeoPoint::default(),
            description: "Chemical discharge detected upstream".to_string(),
            issued_at: fixed_now(),
        }
    }

    #[test]
    fn test_seeded_state_raises_nothing() {
        let state = quiet_state();
        let mut alerts = AlertState::new();
        let recorder = Recorder::default();
        let report = evaluate(&state, &mut alerts, &AlertThresholds::default(), &recorder);
        assert!(report.emitted.is_empty());
        assert!(report.faults.is_empty());
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_low_ph_fires_with_severity_tier() {
        let mut state = quiet_state();
        state.sensors[2].chemistry.ph = 5.9;
        let mut alerts = AlertState::new();
        let recorder = Recorder::default();
        let report = evaluate(&state, &mut alerts, &AlertThresholds::default(), &recorder);

        assert_eq!(report.emitted.len(), 1);
        let emitted = &report.emitted[0];
        assert_eq!(emitted.class, AlertClass::PhLow);
        assert_eq!(emitted.context.entity_id, "SNS-003");
        assert_eq!(emitted.notification.severity_hint, Severity::Critical);
        assert!(emitted.delivered);
        assert!(alerts.is_alerted(AlertClass::PhLow, "SNS-003"));
    }

    #[test]
    fn test_waste_fires_per_sensor() {
        let mut state = quiet_state();
        state.sensors[0].waste_level = 70.0;
        state.sensors[1].waste_level = 90.0;
        let mut alerts = AlertState::new();
        let recorder = Recorder::default();
        let report = evaluate(&state, &mut alerts, &AlertThresholds::default(), &recorder);

        let severities: Vec<_> = report
            .emitted_for(AlertClass::WasteHigh)
            .map(|a| a.notification.severity_hint)
            .collect();
        assert_eq!(severities, vec![Severity::High, Severity::Critical]);
    }

    #[test]
    fn test_flood_is_evaluated_once_globally() {
        let mut state = quiet_state();
        state.forecast.risk_level = 72.0;
        for sensor in &mut state.sensors {
            sensor.flood_risk = 95.0;
        }
        let mut alerts = AlertState::new();
        let recorder = Recorder::default();
        let report = evaluate(&state, &mut alerts, &AlertThresholds::default(), &recorder);

        assert_eq!(recorder.count(AlertClass::FloodHigh), 1);
        assert_eq!(report.emitted[0].context.entity_id, FORECAST_ENTITY);
        assert_eq!(report.emitted[0].notification.severity_hint, Severity::Medium);
    }

    #[test]
    fn test_only_urgent_safety_alerts_notify() {
        let mut state = quiet_state();
        state.safety_alerts.push(safety("SA-000001", Severity::Low));
        state.safety_alerts.push(safety("SA-000002", Severity::High));
        state.safety_alerts.push(safety("SA-000003", Severity::Critical));
        let mut alerts = AlertState::new();
        let recorder = Recorder::default();
        evaluate(&state, &mut alerts, &AlertThresholds::default(), &recorder);

        assert_eq!(recorder.count(AlertClass::SafetyCritical), 2);
        assert!(!alerts.is_alerted(AlertClass::SafetyCritical, "SA-000001"));
    }

    #[test]
    fn test_superseded_safety_alert_is_garbage_collected() {
        let mut state = quiet_state();
        state.safety_alerts = crate::queue::CappedQueue::new(1);
        state.safety_alerts.push(safety("SA-000001", Severity::Critical));
        let mut alerts = AlertState::new();
        let recorder = Recorder::default();
        let thresholds = AlertThresholds::default();

        evaluate(&state, &mut alerts, &thresholds, &recorder);
        assert!(alerts.is_alerted(AlertClass::SafetyCritical, "SA-000001"));

        // A newer alert pushes the old one out of the capped list.
        state.safety_alerts.push(safety("SA-000002", Severity::Medium));
        let report = evaluate(&state, &mut alerts, &thresholds, &recorder);
        assert!(!alerts.is_alerted(AlertClass::SafetyCritical, "SA-000001"));
        assert!(report.cleared.is_empty(), "garbage collection is not a clear transition");
        assert_eq!(recorder.count(AlertClass::SafetyCritical), 1);
    }

    #[test]
    fn test_faulted_sensor_does_not_block_the_others() {
        let mut state = quiet_state();
        state.sensors[0].chemistry.ph = f64::NAN;
        state.sensors[1].chemistry.ph = 6.2;
        state.sensors[1].waste_level = 60.0;
        state.forecast.risk_level = 90.0;
        let mut alerts = AlertState::new();
        let recorder = Recorder::default();
        let report = evaluate(&state, &mut alerts, &AlertThresholds::default(), &recorder);

        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].class, AlertClass::PhLow);
        assert_eq!(report.faults[0].error.entity(), "SNS-001");
        // Only the faulted sensor is skipped; its low neighbour still fires.
        assert_eq!(recorder.count(AlertClass::PhLow), 1);
        assert!(alerts.is_alerted(AlertClass::PhLow, "SNS-002"));
        assert!(!alerts.is_alerted(AlertClass::PhLow, "SNS-001"));
        assert_eq!(recorder.count(AlertClass::WasteHigh), 1);
        assert_eq!(recorder.count(AlertClass::FloodHigh), 1);
    }

    #[test]
    fn test_faulted_entity_keeps_its_alert() {
        let mut state = quiet_state();
        let mut alerts = AlertState::new();
        alerts.insert(AlertClass::PhLow, "SNS-001");
        alerts.insert(AlertClass::PhLow, "SNS-002");
        state.sensors[0].chemistry.ph = f64::INFINITY;
        let recorder = Recorder::default();
        let report = evaluate(&state, &mut alerts, &AlertThresholds::default(), &recorder);

        assert!(
            alerts.is_alerted(AlertClass::PhLow, "SNS-001"),
            "a faulted entity must neither clear nor be garbage-collected"
        );
        // SNS-002 reads a healthy pH and clears as usual.
        assert!(!alerts.is_alerted(AlertClass::PhLow, "SNS-002"));
        assert_eq!(
            report.cleared,
            vec![ClearedAlert {
                class: AlertClass::PhLow,
                entity_id: "SNS-002".to_string()
            }]
        );
    }

    #[test]
    fn test_non_finite_forecast_keeps_flood_alert() {
        let mut state = quiet_state();
        let mut alerts = AlertState::new();
        alerts.insert(AlertClass::FloodHigh, FORECAST_ENTITY);
        state.forecast.risk_level = f64::NAN;
        let recorder = Recorder::default();
        let report = evaluate(&state, &mut alerts, &AlertThresholds::default(), &recorder);

        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].class, AlertClass::FloodHigh);
        assert!(alerts.is_alerted(AlertClass::FloodHigh, FORECAST_ENTITY));
    }

    #[test]
    fn test_alert_for_removed_sensor_is_released() {
        let mut state = quiet_state();
        let mut alerts = AlertState::new();
        alerts.insert(AlertClass::WasteHigh, "SNS-404");
        let recorder = Recorder::default();
        evaluate(&state, &mut alerts, &AlertThresholds::default(), &recorder);
        assert!(!alerts.is_alerted(AlertClass::WasteHigh, "SNS-404"));
        state.sensors.clear();
        evaluate(&state, &mut alerts, &AlertThresholds::default(), &recorder);
        assert!(alerts.is_empty());
    }
}
