//! Biome fitness scoring
//!
//! Scores a genome against the current biome's trait targets and
//! categorical gates. Evaluative only; never mutates state.

use biomorph_genome::Genome;

use crate::biome::{BiomeRegistry, Gate};
use crate::environment::Environment;

/// Result of scoring a genome against a biome
#[derive(Debug, Clone)]
pub struct FitnessReport {
    /// Clamped to [0, 2]; 1.0 is neutral
    pub fitness: f32,
    pub penalty_total: f32,
    pub bonus_total: f32,
    /// Names of every satisfied gate
    pub tags: Vec<&'static str>,
}

/// Score a genome against the environment's biome.
///
/// Penalty per targeted trait is the normalized squared deviation
/// `(|value - target| / tolerance)^2 * strength`; each satisfied gate adds
/// its fixed bonus and tag. Fitness never leaves [0, 2].
pub fn score(genome: &Genome, environment: &Environment, registry: &BiomeRegistry) -> FitnessReport {
    let profile = registry.get(environment.biome);

    let mut penalty_total = 0.0;
    for target in &profile.trait_targets {
        let deviation = (genome.get(target.key) - target.target).abs() / target.tolerance;
        penalty_total += deviation * deviation * target.strength;
    }

    let mut bonus_total = 0.0;
    let mut tags = Vec::new();
    for gate in registry.gates_for(environment.biome) {
        if gate_satisfied(gate, genome) {
            bonus_total += gate.bonus;
            tags.push(gate.name);
        }
    }

    FitnessReport {
        fitness: (1.0 + bonus_total - penalty_total).clamp(0.0, 2.0),
        penalty_total,
        bonus_total,
        tags,
    }
}

fn gate_satisfied(gate: &Gate, genome: &Genome) -> bool {
    gate.requirements.iter().all(|req| {
        let value = genome.get(req.key);
        req.min.map_or(true, |min| value > min) && req.max.map_or(true, |max| value < max)
    })
}

/// Collapse the biome's targets and directional bias into one alignment
/// scalar in [0, 1]. Used by the cycle runner for foraging and stress.
pub(crate) fn biome_alignment(genome: &Genome, environment: &Environment, registry: &BiomeRegistry) -> f32 {
    let profile = registry.get(environment.biome);

    // Closeness to targets, weighted by strength
    let mut closeness = 0.0;
    let mut weight = 0.0;
    for target in &profile.trait_targets {
        let deviation = ((genome.get(target.key) - target.target).abs() / target.tolerance).min(1.0);
        closeness += (1.0 - deviation) * target.strength;
        weight += target.strength;
    }
    let target_align = if weight > 0.0 { closeness / weight } else { 0.6 };

    // Agreement with the directional bias: a positive bias rewards high
    // trait values, a negative bias rewards low ones
    let mut agreement = 0.0;
    let mut bias_weight = 0.0;
    for &(key, bias) in &profile.trait_bias {
        let value = genome.get(key);
        agreement += if bias >= 0.0 { value } else { 1.0 - value } * bias.abs();
        bias_weight += bias.abs();
    }
    let bias_align = if bias_weight > 0.0 {
        agreement / bias_weight
    } else {
        0.6
    };

    (target_align * 0.6 + bias_align * 0.4).clamp(0.0, 1.0)
}
