//! Environment and evolution for Biomorph
//!
//! This crate implements:
//! - The continuous environment state and its per-tick stepper
//! - The biome registry: one canonical profile schema, validated at load
//! - The biome fitness scorer (trait targets + categorical gates)
//! - The evolutionary cycle runner with explicit per-run session state
//! - A secondary population simulation

pub mod biome;
pub mod cycle;
pub mod environment;
pub mod fitness;
pub mod population;

pub use biome::{BiomeId, BiomeProfile, BiomeRegistry, BiomeSchemaError};
pub use cycle::{CauseOfDeath, CycleOptions, CycleOutcome, Session};
pub use environment::{Environment, EnvironmentHistory, StepOptions};
pub use fitness::{score, FitnessReport};
pub use population::{PopulationSim, PopulationSummary};
