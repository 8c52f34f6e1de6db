//! The tick function: advances every sensor and the forecast by one bounded
//! random step, then gives each event queue its independent chance of a new
//! entry.
//!
//! # Randomness injection
//! The engine is generic over its random source. Production sessions use a
//! `SmallRng` seeded from configuration or entropy; tests seed explicitly so
//! every run is reproducible.

use chrono::{DateTime, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::analysis::health::sensor_health;
use crate::logging::{self, Component, FaultKind};
use crate::model::{
    Biodiversity, FieldError, FloodForecast, MonitoringState, SensorReading,
};
use crate::queue::CappedQueue;
use crate::simulation::bounds::{self, FieldBounds};
use crate::simulation::events::{self, EventRates};
use crate::simulation::walk;
use crate::stations::STATION_REGISTRY;

/// Id used for faults raised while advancing the global forecast.
pub const FORECAST_ENTITY: &str = "flood-forecast";

// ---------------------------------------------------------------------------
// Tick report
// ---------------------------------------------------------------------------

/// A field that kept its previous value because it could not be advanced.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFault {
    pub entity: String,
    pub error: FieldError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDomain {
    Waste,
    Safety,
    Citizen,
    Flood,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedEvent {
    pub domain: EventDomain,
    pub id: String,
}

/// What a single tick changed beyond the drift of numeric fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub faults: Vec<FieldFault>,
    pub injected: Vec<InjectedEvent>,
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Builds the initial state from the station registry.
pub fn seed_state(now: DateTime<Utc>, queue_cap: usize) -> MonitoringState {
    let sensors = STATION_REGISTRY
        .iter()
        .map(|station| {
            let mut reading = SensorReading {
                id: station.site_id.to_string(),
                name: station.name.to_string(),
                location: station.location(),
                chemistry: station.baseline,
                waste_level: station.baseline_waste_level,
                flood_risk: station.baseline_flood_risk,
                biodiversity: Biodiversity {
                    species_count: station.baseline_species_count,
                    diversity_index: station.baseline_diversity_index,
                },
                status: crate::model::HealthCategory::Fair,
                last_updated: now,
            };
            reading.status = sensor_health(&reading).category;
            reading
        })
        .collect();

    MonitoringState {
        tick: 0,
        sensors,
        forecast: FloodForecast {
            risk_level: 25.0,
            water_level_m: 2.5,
            rainfall_mm: 10.0,
            issued_at: now,
        },
        waste_detections: CappedQueue::new(queue_cap),
        flood_alerts: CappedQueue::new(queue_cap),
        safety_alerts: CappedQueue::new(queue_cap),
        citizen_reports: CappedQueue::new(queue_cap),
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct SimulationEngine<R = SmallRng> {
    rng: R,
    rates: EventRates,
    next_event_seq: u64,
}

impl SimulationEngine<SmallRng> {
    /// Reproducible engine: the same seed yields the same sequence of states.
    pub fn seeded(seed: u64, rates: EventRates) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed), rates)
    }

    pub fn from_entropy(rates: EventRates) -> Self {
        Self::with_rng(SmallRng::from_entropy(), rates)
    }
}

impl<R: Rng> SimulationEngine<R> {
    pub fn with_rng(rng: R, rates: EventRates) -> Self {
        Self {
            rng,
            rates,
            next_event_seq: 1,
        }
    }

    /// Advances `state` by one tick.
    ///
    /// Never fails as a whole: a field that cannot be advanced keeps its
    /// previous value and is reported in the returned [`TickReport`].
    pub fn tick(&mut self, state: &mut MonitoringState, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();

        for sensor in &mut state.sensors {
            self.advance_sensor(sensor, now, &mut report.faults);
        }
        self.advance_forecast(&mut state.forecast, now, &mut report.faults);
        self.inject_events(state, now, &mut report.injected);

        state.tick += 1;
        report.tick = state.tick;

        for fault in &report.faults {
            logging::log_fault(FaultKind::Simulation, &fault.entity, "advance field", &fault.error);
        }
        report
    }

    fn advance_sensor(
        &mut self,
        sensor: &mut SensorReading,
        now: DateTime<Utc>,
        faults: &mut Vec<FieldFault>,
    ) {
        let id = sensor.id.as_str();
        let faults_before = faults.len();
        let chem = &mut sensor.chemistry;
        let fields: [(&mut f64, &FieldBounds); 9] = [
            (&mut chem.ph, &bounds::PH),
            (&mut chem.dissolved_oxygen_mg_l, &bounds::DISSOLVED_OXYGEN),
            (&mut chem.bod_mg_l, &bounds::BOD),
            (&mut chem.cod_mg_l, &bounds::COD),
            (&mut chem.tds_mg_l, &bounds::TDS),
            (&mut chem.turbidity_ntu, &bounds::TURBIDITY),
            (&mut chem.temperature_c, &bounds::TEMPERATURE),
            (&mut sensor.waste_level, &bounds::WASTE_LEVEL),
            (&mut sensor.flood_risk, &bounds::FLOOD_RISK),
        ];
        for (field, field_bounds) in fields {
            record(walk::advance(field, field_bounds, &mut self.rng), id, faults);
        }

        let bio = &mut sensor.biodiversity;
        match walk::step_count(bio.species_count, &bounds::SPECIES_COUNT, &mut self.rng) {
            Ok(next) => bio.species_count = next,
            Err(error) => record(Err(error), id, faults),
        }
        record(
            walk::advance(&mut bio.diversity_index, &bounds::DIVERSITY_INDEX, &mut self.rng),
            id,
            faults,
        );

        sensor.status = sensor_health(sensor).category;
        // A sensor that faulted did not produce a full reading and ages toward stale.
        if faults.len() == faults_before {
            sensor.last_updated = now;
        }
    }

    fn advance_forecast(
        &mut self,
        forecast: &mut FloodForecast,
        now: DateTime<Utc>,
        faults: &mut Vec<FieldFault>,
    ) {
        let faults_before = faults.len();
        let fields: [(&mut f64, &FieldBounds); 3] = [
            (&mut forecast.risk_level, &bounds::FORECAST_RISK),
            (&mut forecast.water_level_m, &bounds::WATER_LEVEL),
            (&mut forecast.rainfall_mm, &bounds::RAINFALL),
        ];
        for (field, field_bounds) in fields {
            record(walk::advance(field, field_bounds, &mut self.rng), FORECAST_ENTITY, faults);
        }
        if faults.len() == faults_before {
            forecast.issued_at = now;
        }
    }

    fn inject_events(
        &mut self,
        state: &mut MonitoringState,
        now: DateTime<Utc>,
        injected: &mut Vec<InjectedEvent>,
    ) {
        // Every domain rolls on every tick so one domain's outcome never
        // shifts another's random stream.
        let waste = events::roll(&mut self.rng, self.rates.waste);
        let safety = events::roll(&mut self.rng, self.rates.safety);
        let citizen = events::roll(&mut self.rng, self.rates.citizen);
        let flood = events::roll(&mut self.rng, self.rates.flood);

        if waste {
            let id = self.next_id("WD");
            if let Some(entry) = events::synthesize_waste(&mut self.rng, id, &state.sensors, now) {
                injected.push(InjectedEvent { domain: EventDomain::Waste, id: entry.id.clone() });
                state.waste_detections.push(entry);
            }
        }
        if safety {
            let id = self.next_id("SA");
            if let Some(entry) = events::synthesize_safety_alert(&mut self.rng, id, &state.sensors, now) {
                injected.push(InjectedEvent { domain: EventDomain::Safety, id: entry.id.clone() });
                state.safety_alerts.push(entry);
            }
        }
        if citizen {
            let id = self.next_id("CR");
            if let Some(entry) = events::synthesize_citizen_report(&mut self.rng, id, &state.sensors, now) {
                injected.push(InjectedEvent { domain: EventDomain::Citizen, id: entry.id.clone() });
                state.citizen_reports.push(entry);
            }
        }
        if flood {
            let id = self.next_id("FA");
            if let Some(entry) = events::synthesize_flood_alert(
                &mut self.rng,
                id,
                &state.sensors,
                &state.forecast,
                now,
            ) {
                injected.push(InjectedEvent { domain: EventDomain::Flood, id: entry.id.clone() });
                state.flood_alerts.push(entry);
            }
        }

        if !injected.is_empty() {
            logging::debug(
                Component::Simulation,
                None,
                &format!("tick {}: injected {} event(s)", state.tick + 1, injected.len()),
            );
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        let id = format!("{}-{:06}", prefix, self.next_event_seq);
        self.next_event_seq += 1;
        id
    }
}

fn record(result: Result<(), FieldError>, entity: &str, faults: &mut Vec<FieldFault>) {
    if let Err(error) = result {
        faults.push(FieldFault {
            entity: entity.to_string(),
            error,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
