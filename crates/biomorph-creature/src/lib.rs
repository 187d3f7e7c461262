//! Phenotype derivation and organism assembly
//!
//! Maps an evolved genome plus its environment into a fully-resolved
//! [`Phenotype`], then assembles that phenotype into a hierarchical
//! [`RenderNode`] tree for the drawing layer. Both stages are pure and
//! deterministic: identical inputs always produce identical outputs.

pub mod assembler;
pub mod budget;
pub mod classify;
pub mod phenotype;

pub use assembler::{assemble, AnimationTag, RenderNode, ShapeKind};
pub use phenotype::{
    derive, AnimationParams, BodyPlan, EyePlacement, LimbType, Locomotion, Phenotype, SkinType,
};
