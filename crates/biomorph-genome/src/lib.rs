//! Trait-vector genomes for Biomorph
//!
//! This crate implements:
//! - A fixed-size vector of normalized heritable traits keyed by [`TraitKey`]
//! - The mutation engine: bounded deltas, a structural complexity ratchet,
//!   and occasional macro mutations

pub mod genome;
pub mod mutation;

pub use genome::{Genome, TraitKey, TRAIT_COUNT};
pub use mutation::{mutate, MutationConfig};
