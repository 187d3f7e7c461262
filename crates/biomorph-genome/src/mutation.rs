//! Mutation engine
//!
//! Perturbs a genome with bounded random deltas, an upward complexity bias
//! on structural traits, and occasional macro mutations. Pure over an
//! injected RNG so tests can seed the sequence.

use rand::Rng;

use crate::genome::{Genome, TraitKey};

/// Tuning for the mutation engine
#[derive(Debug, Clone)]
pub struct MutationConfig {
    /// Probability that any given trait receives a random delta
    pub per_trait_rate: f32,
    /// Constant positive bias added to structural traits when they mutate
    /// (the complexity ratchet)
    pub structural_bias: f32,
    /// Macro-mutation probability is this factor times the genome's
    /// mutation-rate trait
    pub macro_rate_factor: f32,
    /// Half-range of a macro jump
    pub macro_jump: f32,
    /// Scale applied to a biome's directional trait bias
    pub nudge_strength: f32,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            per_trait_rate: 0.3,
            structural_bias: 0.004,
            macro_rate_factor: 0.05,
            macro_jump: 0.25,
            nudge_strength: 0.02,
        }
    }
}

/// Mutate a genome, returning a new one.
///
/// `magnitude` bounds the per-trait random delta to
/// [-magnitude/2, +magnitude/2]. `nudge` is a directional trait bias
/// (typically the current biome's), each entry in [-1, 1]. Every trait is
/// clamped to [0, 1] afterward.
pub fn mutate<R: Rng>(
    genome: &Genome,
    config: &MutationConfig,
    magnitude: f32,
    nudge: &[(TraitKey, f32)],
    rng: &mut R,
) -> Genome {
    let mut next = genome.clone();
    let half = magnitude.max(0.0) * 0.5;

    for key in TraitKey::ALL {
        if rng.gen::<f32>() >= config.per_trait_rate {
            continue;
        }
        let mut value = next.get(key);
        if half > 0.0 {
            value += rng.gen_range(-half..half);
        }
        // Growing structure is easier than losing it
        if TraitKey::STRUCTURAL.contains(&key) {
            value += config.structural_bias;
        }
        next.set(key, value);
    }

    for &(key, bias) in nudge {
        let value = next.get(key) + bias * config.nudge_strength;
        next.set(key, value);
    }

    let macro_chance = config.macro_rate_factor * genome.get(TraitKey::MutationRate);
    if rng.gen::<f32>() < macro_chance {
        let key = TraitKey::ALL[rng.gen_range(0..TraitKey::ALL.len())];
        let value = next.get(key);
        let jumped = if key == TraitKey::BodySize && value < 0.3 {
            // Small bodies get a strong upward push instead of a blind jump
            value + rng.gen_range(0.2..0.45)
        } else {
            value + rng.gen_range(-config.macro_jump..config.macro_jump)
        };
        log::debug!("macro mutation on {}: {:.3} -> {:.3}", key, value, jumped);
        next.set(key, jumped);
    }

    debug_assert!(next.is_normalized());
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    #[test]
    fn test_mutation_preserves_clamp_invariant() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(7);
        let config = MutationConfig::default();
        let mut genome = Genome::genesis();

        for _ in 0..1000 {
            genome = mutate(&genome, &config, 1.0, &[], &mut rng);
            assert!(genome.is_normalized());
        }
    }

    #[test]
    fn test_mutation_returns_new_genome() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(11);
        let config = MutationConfig::default();
        let genome = Genome::genesis();

        let _ = mutate(&genome, &config, 0.5, &[], &mut rng);
        assert_eq!(genome, Genome::genesis(), "input must not be mutated");
    }

    #[test]
    fn test_zero_magnitude_only_applies_ratchet() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(3);
        let config = MutationConfig {
            macro_rate_factor: 0.0, // isolate the delta path
            ..MutationConfig::default()
        };
        let genome = Genome::genesis();

        let next = mutate(&genome, &config, 0.0, &[], &mut rng);

        for (key, value) in next.iter() {
            let before = genome.get(key);
            if TraitKey::STRUCTURAL.contains(&key) {
                // At most the constant bias, never a random delta
                assert!(value >= before);
                assert!(value - before <= config.structural_bias + 1e-6);
            } else {
                assert_eq!(value, before, "{} changed with zero magnitude", key);
            }
        }
    }

    #[test]
    fn test_high_magnitude_saturates_traits() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(99);
        let config = MutationConfig::default();
        let mut genome = Genome::genesis();

        for _ in 0..2000 {
            genome = mutate(&genome, &config, 1.0, &[], &mut rng);
        }

        // A clamped walk with +/-0.5 steps piles up at the boundaries
        let extreme = genome
            .iter()
            .filter(|(_, v)| *v <= 0.2 || *v >= 0.8)
            .count();
        assert!(
            extreme >= TraitKey::ALL.len() / 3,
            "expected saturation, got {} extreme traits",
            extreme
        );
    }

    #[test]
    fn test_nudge_pushes_trait_direction() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(21);
        let config = MutationConfig {
            per_trait_rate: 0.0, // isolate the nudge path
            macro_rate_factor: 0.0,
            ..MutationConfig::default()
        };
        let genome = Genome::genesis();

        let next = mutate(
            &genome,
            &config,
            0.0,
            &[(TraitKey::WaterRetention, 1.0)],
            &mut rng,
        );
        assert!(next.get(TraitKey::WaterRetention) > genome.get(TraitKey::WaterRetention));
    }

    #[test]
    fn test_mutation_deterministic_under_seed() {
        let config = MutationConfig::default();
        let genome = Genome::genesis();

        let mut rng1 = Xoshiro256StarStar::seed_from_u64(42);
        let mut rng2 = Xoshiro256StarStar::seed_from_u64(42);

        let a = mutate(&genome, &config, 0.8, &[], &mut rng1);
        let b = mutate(&genome, &config, 0.8, &[], &mut rng2);
        assert_eq!(a, b);
    }
}
