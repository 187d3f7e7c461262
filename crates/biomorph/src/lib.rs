//! # Biomorph - Creature Evolution Sandbox
//!
//! Evolves a trait-vector genome through environmental cycles and derives
//! a renderable creature morphology from the result.

pub use biomorph_creature::{
    assemble, derive, AnimationParams, BodyPlan, Locomotion, Phenotype, RenderNode,
};
pub use biomorph_genome::{mutate, Genome, MutationConfig, TraitKey};
pub use biomorph_world::{
    score, BiomeId, BiomeRegistry, CycleOptions, Environment, FitnessReport, PopulationSim,
    Session, StepOptions,
};

/// Common imports for internal use
pub mod prelude {
    pub use biomorph_creature::{assemble, derive, Phenotype, RenderNode};
    pub use biomorph_genome::Genome;
    pub use biomorph_world::{BiomeId, BiomeRegistry, Environment, Session};
}
