//! The monitoring session: single writer of the simulated river.
//!
//! Owns the state, the simulation engine and the alert state behind one
//! mutex. Scheduled ticks are single-flight: a tick that finds another in
//! progress is skipped rather than queued. A manual refresh waits its turn
//! and then runs through the same path. Readers get cloned snapshots and
//! never observe a half-applied tick. The tick counter is also published
//! through an atomic so progress can be polled without taking the lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use chrono::{DateTime, Utc};

use crate::alert::evaluator::{self, ClearedAlert, EmittedAlert};
use crate::alert::notifier::Notifier;
use crate::alert::stalenesses;
use crate::alert::state::AlertState;
use crate::alert::thresholds::AlertThresholds;
use crate::analysis::health::assess_state;
use crate::analysis::scoring::HealthScore;
use crate::config::MonitorConfig;
use crate::logging::{self, Component};
use crate::model::MonitoringState;
use crate::simulation::engine::{InjectedEvent, SimulationEngine, seed_state};

// ---------------------------------------------------------------------------
// Tick results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    pub tick: u64,
    pub injected: Vec<InjectedEvent>,
    pub emitted: Vec<EmittedAlert>,
    pub cleared: Vec<ClearedAlert>,
    /// Fields that kept their previous value this tick.
    pub simulation_faults: usize,
    /// Entities whose alert check faulted this tick.
    pub check_faults: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Completed(TickSummary),
    /// Another tick held the session.
    Skipped,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

struct SessionCore {
    state: MonitoringState,
    engine: SimulationEngine,
    alerts: AlertState,
}

pub struct MonitoringSession {
    core: Mutex<SessionCore>,
    /// Last completed tick, written after the core is fully updated.
    completed: AtomicU64,
    thresholds: AlertThresholds,
    max_age_minutes: u64,
    notifier: Arc<dyn Notifier>,
}

impl MonitoringSession {
    pub fn new(config: &MonitorConfig, notifier: Arc<dyn Notifier>, now: DateTime<Utc>) -> Self {
        let rates = config.simulation.rates;
        let engine = match config.simulation.seed {
            Some(seed) => SimulationEngine::seeded(seed, rates),
            None => SimulationEngine::from_entropy(rates),
        };

        logging::info(
            Component::Session,
            None,
            &format!(
                "Session started with {} sensors (seed: {})",
                crate::stations::STATION_REGISTRY.len(),
                config
                    .simulation
                    .seed
                    .map_or_else(|| "entropy".to_string(), |s| s.to_string())
            ),
        );

        Self {
            core: Mutex::new(SessionCore {
                state: seed_state(now, config.simulation.queue_cap),
                engine,
                alerts: AlertState::new(),
            }),
            completed: AtomicU64::new(0),
            thresholds: config.alerts,
            max_age_minutes: config.staleness.max_age_minutes,
            notifier,
        }
    }

    /// Scheduled tick. Skipped if another tick is in progress.
    pub fn tick(&self, now: DateTime<Utc>) -> TickOutcome {
        match self.core.try_lock() {
            Ok(mut core) => TickOutcome::Completed(self.run_tick(&mut core, now)),
            Err(TryLockError::Poisoned(poisoned)) => {
                let mut core = poisoned.into_inner();
                TickOutcome::Completed(self.run_tick(&mut core, now))
            }
            Err(TryLockError::WouldBlock) => {
                logging::debug(Component::Session, None, "Tick already in progress; skipped");
                TickOutcome::Skipped
            }
        }
    }

    /// Manual refresh. Waits for any in-flight tick, then runs a full one.
    pub fn refresh(&self, now: DateTime<Utc>) -> TickSummary {
        let mut core = self.lock();
        self.run_tick(&mut core, now)
    }

    fn run_tick(&self, core: &mut SessionCore, now: DateTime<Utc>) -> TickSummary {
        let SessionCore {
            state,
            engine,
            alerts,
        } = core;

        let sim = engine.tick(state, now);
        let eval = evaluator::evaluate(state, alerts, &self.thresholds, self.notifier.as_ref());

        let summary = TickSummary {
            tick: sim.tick,
            injected: sim.injected,
            emitted: eval.emitted,
            cleared: eval.cleared,
            simulation_faults: sim.faults.len(),
            check_faults: eval.faults.len(),
        };
        logging::log_tick_summary(
            summary.tick,
            summary.emitted.len(),
            summary.cleared.len(),
            summary.simulation_faults + summary.check_faults,
        );
        self.completed.store(summary.tick, Ordering::Release);
        summary
    }

    // A panic inside a tick leaves the previous fields in place, so the
    // state behind a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, SessionCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Readers
    // -----------------------------------------------------------------------

    /// Number of completed ticks. Never blocks.
    pub fn current_tick(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> MonitoringState {
        self.lock().state.clone()
    }

    pub fn alert_state(&self) -> AlertState {
        self.lock().alerts.clone()
    }

    /// River-wide composite score for the current snapshot.
    pub fn health(&self) -> HealthScore {
        assess_state(&self.lock().state)
    }

    pub fn snapshot_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.lock().state)
    }

    pub fn stale_sensors(&self, now: DateTime<Utc>) -> Vec<String> {
        stalenesses::stale_sensors(&self.lock().state, self.max_age_minutes, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::notifier::LogNotifier;
    use crate::alert::state::AlertClass;
    use chrono::{Duration, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 12, 8, 0, 0).unwrap()
    }

    fn seeded_config(seed: u64) -> MonitorConfig {
        let mut config = MonitorConfig::default();
        config.simulation.seed = Some(seed);
        config
    }

    #[test]
    fn test_refresh_advances_one_tick() {
        let session = MonitoringSession::new(&seeded_config(1), Arc::new(LogNotifier), fixed_now());
        assert_eq!(session.snapshot().tick, 0);
        let summary = session.refresh(fixed_now() + Duration::seconds(5));
        assert_eq!(summary.tick, 1);
        assert_eq!(session.snapshot().tick, 1);
    }

    #[test]
    fn test_current_tick_tracks_completed_ticks() {
        let session = MonitoringSession::new(&seeded_config(6), Arc::new(LogNotifier), fixed_now());
        assert_eq!(session.current_tick(), 0);
        for i in 1..=3 {
            session.refresh(fixed_now() + Duration::seconds(5 * i));
        }
        assert!(matches!(session.tick(fixed_now()), TickOutcome::Completed(_)));
        assert_eq!(session.current_tick(), 4);
        assert_eq!(session.current_tick(), session.snapshot().tick);
    }

    #[test]
    fn test_uncontended_tick_completes() {
        let session = MonitoringSession::new(&seeded_config(2), Arc::new(LogNotifier), fixed_now());
        assert!(matches!(session.tick(fixed_now()), TickOutcome::Completed(_)));
    }

    #[test]
    fn test_same_seed_same_history() {
        let a = MonitoringSession::new(&seeded_config(99), Arc::new(LogNotifier), fixed_now());
        let b = MonitoringSession::new(&seeded_config(99), Arc::new(LogNotifier), fixed_now());
        for i in 1..=25 {
            let now = fixed_now() + Duration::seconds(5 * i);
            a.refresh(now);
            b.refresh(now);
        }
        assert_eq!(a.snapshot(), b.snapshot());
        assert_eq!(a.alert_state(), b.alert_state());
    }

    #[test]
    fn test_lowered_ph_threshold_alerts_every_sensor_once() {
        let mut config = seeded_config(3);
        config.alerts.ph_low = 9.0;
        let session = MonitoringSession::new(&config, Arc::new(LogNotifier), fixed_now());

        let first = session.refresh(fixed_now());
        let ph_alerts = first
            .emitted
            .iter()
            .filter(|a| a.class == AlertClass::PhLow)
            .count();
        assert_eq!(ph_alerts, crate::stations::STATION_REGISTRY.len());

        let second = session.refresh(fixed_now());
        assert!(second.emitted.iter().all(|a| a.class != AlertClass::PhLow));
    }

    #[test]
    fn test_snapshot_json_is_parseable() {
        let session = MonitoringSession::new(&seeded_config(4), Arc::new(LogNotifier), fixed_now());
        let json = session.snapshot_json().unwrap();
        let parsed: MonitoringState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, session.snapshot());
    }

    #[test]
    fn test_skipped_ticks_make_sensors_stale() {
        let session = MonitoringSession::new(&seeded_config(5), Arc::new(LogNotifier), fixed_now());
        assert!(session.stale_sensors(fixed_now()).is_empty());
        assert_eq!(
            session.stale_sensors(fixed_now() + Duration::minutes(16)).len(),
            crate::stations::STATION_REGISTRY.len()
        );
    }
}
