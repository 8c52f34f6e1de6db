/// Periodic environmental simulation.
///
/// Submodules:
/// - `bounds`: closed interval and walk step for every numeric field.
/// - `walk`:   the bounded random walk step.
/// - `events`: synthesis of entries for the capped event queues.
/// - `engine`: the tick function and initial seeding.

pub mod bounds;
pub mod engine;
pub mod events;
pub mod walk;

pub use engine::{seed_state, SimulationEngine, TickReport};
pub use events::EventRates;
