//! Pixel creatures on a torus grid: organisms built from coloured pixels move by
//! evolved attraction rules, eat what their colours beat, reproduce and starve.

pub mod behaviour;
pub mod config;
pub mod error;
pub mod geometry;
pub mod organism;
pub mod pixel;
pub mod random;
pub mod species;
pub mod top_species;
pub mod victim_map;
pub mod world;

pub use behaviour::{Behaviour, BehaviourTable};
pub use config::{MutationRates, SimulationConfig};
pub use error::SimError;
pub use geometry::{Direction, Position};
pub use organism::{MovementParams, Organism, OrganismId};
pub use pixel::{Channel, Pixel};
pub use species::Species;
pub use top_species::{SpeciesCount, SpeciesSummary, TopSpecies};
pub use victim_map::{Victim, VictimMap};
pub use world::{TickSummary, World};
