//! Evolutionary cycle runner
//!
//! Combines genome, environment and biome scoring into one step: energy and
//! stress deltas, a survival check, and the mutation decision. All per-run
//! counters live on [`Session`] so separate simulations never share state.

use rand::Rng;
use serde::{Deserialize, Serialize};

use biomorph_genome::{mutate, Genome, MutationConfig, TraitKey};

use crate::biome::{BiomeId, BiomeRegistry};
use crate::environment::{step, Environment, StepOptions};
use crate::fitness::biome_alignment;

/// Cycles of near-zero mutation rate before a forced mutation
const LOW_MUTATION_STREAK_LIMIT: u32 = 200;
/// Magnitude of the forced anti-stagnation mutation
const FORCED_MUTATION_MAGNITUDE: f32 = 0.35;
/// Cycle after which sessile lineages get a mutation-chance boost
const SESSILE_STAGNATION_CYCLE: u64 = 2000;

/// Modeled death causes; reported, never thrown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CauseOfDeath {
    Starvation,
    EnvironmentalStress,
}

impl std::fmt::Display for CauseOfDeath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CauseOfDeath::Starvation => write!(f, "Starvation"),
            CauseOfDeath::EnvironmentalStress => write!(f, "Environmental Stress"),
        }
    }
}

/// Caller options for one cycle
#[derive(Debug, Clone)]
pub struct CycleOptions {
    /// When set, death causes are still reported but never flip `survived`
    /// (the default "never die" visualizer mode)
    pub disable_death: bool,
}

impl Default for CycleOptions {
    fn default() -> Self {
        Self { disable_death: true }
    }
}

/// Result of one evolutionary cycle
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub survived: bool,
    pub energy_delta: f32,
    pub stress_delta: f32,
    /// Present when the mutation roll succeeded (or was forced)
    pub mutated: Option<Genome>,
    pub cause_of_death: Option<CauseOfDeath>,
    /// Collapsed biome alignment in [0, 1]
    pub alignment: f32,
}

/// Per-run simulation state.
///
/// Holds the counters the cycle runner needs across ticks; create a fresh
/// session (or call [`Session::reset`]) when a new run starts.
#[derive(Debug, Clone)]
pub struct Session {
    pub cycle_count: u64,
    low_mutation_streak: u32,
    mutation_config: MutationConfig,
}

impl Session {
    pub fn new() -> Self {
        Self {
            cycle_count: 0,
            low_mutation_streak: 0,
            mutation_config: MutationConfig::default(),
        }
    }

    /// Clear all counters for a new run
    pub fn reset(&mut self) {
        self.cycle_count = 0;
        self.low_mutation_streak = 0;
    }

    /// Run one evolutionary cycle.
    ///
    /// Total over its whole input domain: every combination produces a
    /// well-formed outcome and death is a field, not an error.
    pub fn run_cycle<R: Rng>(
        &mut self,
        genome: &Genome,
        environment: &Environment,
        registry: &BiomeRegistry,
        opts: &CycleOptions,
        rng: &mut R,
    ) -> CycleOutcome {
        let body_size = genome.get(TraitKey::BodySize);
        let mobility = genome.get(TraitKey::LocomotionMode);
        let limbs = genome.get(TraitKey::LimbCount);

        // 1. Metabolic upkeep
        let upkeep = body_size * 0.25
            + genome.get(TraitKey::MetabolicRate) * 0.3
            + genome.get(TraitKey::Sociality) * 0.1;

        // 2. Foraging: biome baseline, bounded luck, feeding strategy and
        //    locomotion synergy
        let mut forage = registry.food_baseline(environment.biome) + rng.gen_range(-0.08..0.08);
        let feeding = genome.get(TraitKey::FeedingStrategy);
        if feeding > 0.6 {
            forage += genome.get(TraitKey::Aggression) * 0.15;
        } else if feeding < 0.4 {
            forage += environment.sunlight * 0.12 + (1.0 - genome.get(TraitKey::MetabolicRate)) * 0.05;
        }
        if mobility > 0.4 && limbs > 0.3 {
            forage += 0.08;
        }

        // 3. Biome pressure: alignment feeds foraging, mismatch feeds stress
        let alignment = biome_alignment(genome, environment, registry);
        let mismatch = 1.0 - alignment;
        forage += alignment * 0.15;

        let mut energy_delta = forage - upkeep;
        let mut stress_delta = mismatch * 0.3 - alignment * 0.1;

        // 4. Environmental stress
        let ideal_temperature = genome.get(TraitKey::Thermoregulation) * 1.4 - 0.7;
        stress_delta += (environment.temperature - ideal_temperature).abs() * 0.35;
        stress_delta += environment.volatility * (1.0 - genome.get(TraitKey::Rigidity)) * 0.25;
        if mobility > 0.5 && limbs < 0.15 {
            // Mobile body plan without limbs to move it
            energy_delta -= 0.1;
            stress_delta += 0.15;
        } else if mobility > 0.5 && limbs > 0.4 {
            energy_delta += 0.05;
        }

        // 5. Survival check
        let cause_of_death = if energy_delta < -0.5 {
            Some(CauseOfDeath::Starvation)
        } else if stress_delta > 0.8 {
            Some(CauseOfDeath::EnvironmentalStress)
        } else {
            None
        };
        let survived = cause_of_death.is_none() || opts.disable_death;
        if let Some(cause) = cause_of_death {
            log::debug!(
                "cycle {}: death condition {} (energy {:.2}, stress {:.2}), survived={}",
                self.cycle_count,
                cause,
                energy_delta,
                stress_delta,
                survived
            );
        }

        // 6. Mutation decision
        let mutated = if survived {
            self.decide_mutation(genome, environment, registry, stress_delta, mismatch, rng)
        } else {
            None
        };

        self.cycle_count += 1;

        CycleOutcome {
            survived,
            energy_delta,
            stress_delta,
            mutated,
            cause_of_death,
            alignment,
        }
    }

    fn decide_mutation<R: Rng>(
        &mut self,
        genome: &Genome,
        environment: &Environment,
        registry: &BiomeRegistry,
        stress_delta: f32,
        mismatch: f32,
        rng: &mut R,
    ) -> Option<Genome> {
        let nudge = &registry.get(environment.biome).trait_bias;

        // Anti-stagnation: lineages that suppress their own mutation rate
        // for too long get one forced, elevated mutation
        if genome.get(TraitKey::MutationRate) < 0.05 {
            self.low_mutation_streak += 1;
        } else {
            self.low_mutation_streak = 0;
        }
        if self.low_mutation_streak >= LOW_MUTATION_STREAK_LIMIT {
            self.low_mutation_streak = 0;
            log::info!("cycle {}: forcing mutation on stagnant lineage", self.cycle_count);
            return Some(mutate(
                genome,
                &self.mutation_config,
                FORCED_MUTATION_MAGNITUDE,
                nudge,
                rng,
            ));
        }

        let mut chance = genome.get(TraitKey::MutationRate)
            + stress_delta.max(0.0) * 0.5
            + environment.volatility * 0.2
            + mismatch * 0.25
            + environment.proximity_density * 0.15
            + environment.travel_rate * 0.1;

        // Sessile lineages stuck past the stagnation horizon mutate readily
        if genome.get(TraitKey::LocomotionMode) < 0.05 && self.cycle_count > SESSILE_STAGNATION_CYCLE {
            chance += 0.5;
        }

        if rng.gen::<f32>() < chance {
            let magnitude = environment.volatility * 0.5 + 0.1 + mismatch * 0.25;
            Some(mutate(genome, &self.mutation_config, magnitude, nudge, rng))
        } else {
            None
        }
    }

    /// Advance many cycles in chunks, stepping the environment each tick.
    ///
    /// All carried state flows through the return value; `on_chunk` runs
    /// between chunks as a cooperative scheduling point (progress callback)
    /// so long jumps never monopolize the caller's loop.
    #[allow(clippy::too_many_arguments)]
    pub fn run_batch<R: Rng, F: FnMut(u64)>(
        &mut self,
        genome: Genome,
        environment: Environment,
        registry: &BiomeRegistry,
        opts: &BatchOptions,
        rng: &mut R,
        mut on_chunk: F,
    ) -> BatchOutcome {
        let mut genome = genome;
        let mut environment = environment;
        let mut deaths = 0;
        let chunk_size = opts.chunk_size.max(1);
        let cycle_opts = CycleOptions {
            disable_death: opts.disable_death,
        };

        let mut done = 0;
        while done < opts.cycles {
            let end = (done + chunk_size).min(opts.cycles);
            for _ in done..end {
                let step_opts = StepOptions {
                    clock_seconds: opts.base_clock_seconds
                        + self.cycle_count as f64 * opts.tick_seconds,
                    locked_biome: opts.locked_biome,
                };
                environment = step(Some(&environment), registry, &step_opts, rng);

                let outcome = self.run_cycle(&genome, &environment, registry, &cycle_opts, rng);
                if let Some(next) = outcome.mutated {
                    genome = next;
                }
                if !outcome.survived {
                    // The lineage ends; a fresh genesis organism takes over
                    deaths += 1;
                    genome = Genome::genesis();
                }
            }
            done = end;
            on_chunk(done);
        }

        BatchOutcome {
            genome,
            environment,
            cycles_run: opts.cycles,
            deaths,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for [`Session::run_batch`]
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub cycles: u64,
    /// Cycles per cooperative chunk
    pub chunk_size: u64,
    pub base_clock_seconds: f64,
    /// Simulated seconds per cycle
    pub tick_seconds: f64,
    pub locked_biome: Option<BiomeId>,
    pub disable_death: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            cycles: 1,
            chunk_size: 512,
            base_clock_seconds: 0.0,
            tick_seconds: 1.0,
            locked_biome: None,
            disable_death: true,
        }
    }
}

/// Result of a batch run; carries all simulation state forward explicitly
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub genome: Genome,
    pub environment: Environment,
    pub cycles_run: u64,
    /// Lineage restarts (only possible when death is enabled)
    pub deaths: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    #[test]
    fn test_cycle_is_total() {
        let registry = BiomeRegistry::default();
        let mut rng = Xoshiro256StarStar::seed_from_u64(1);
        let mut session = Session::new();
        let env = Environment::genesis(BiomeId::Desert);

        // Even a pathological genome produces a well-formed outcome
        let genome = Genome::genesis()
            .with_trait(TraitKey::BodySize, 1.0)
            .with_trait(TraitKey::MetabolicRate, 1.0)
            .with_trait(TraitKey::WaterRetention, 0.0);

        let outcome = session.run_cycle(&genome, &env, &registry, &CycleOptions::default(), &mut rng);
        assert!(outcome.energy_delta.is_finite());
        assert!(outcome.stress_delta.is_finite());
    }

    #[test]
    fn test_disable_death_reports_cause_but_survives() {
        let registry = BiomeRegistry::default();
        let mut rng = Xoshiro256StarStar::seed_from_u64(2);
        let mut session = Session::new();

        // Starvation setup: huge hot body in the poorest biome
        let env = Environment::genesis(BiomeId::Desert);
        let genome = Genome::genesis()
            .with_trait(TraitKey::BodySize, 1.0)
            .with_trait(TraitKey::MetabolicRate, 1.0)
            .with_trait(TraitKey::Sociality, 1.0)
            .with_trait(TraitKey::FeedingStrategy, 0.5)
            .with_trait(TraitKey::WaterRetention, 0.0)
            .with_trait(TraitKey::Thermoregulation, 0.0);

        let mut saw_cause = false;
        for _ in 0..200 {
            let outcome =
                session.run_cycle(&genome, &env, &registry, &CycleOptions::default(), &mut rng);
            assert!(outcome.survived, "disable_death must keep the organism alive");
            saw_cause |= outcome.cause_of_death.is_some();
        }
        assert!(saw_cause, "expected a reported death cause");
    }

    #[test]
    fn test_death_enabled_flips_survived() {
        let registry = BiomeRegistry::default();
        let mut rng = Xoshiro256StarStar::seed_from_u64(3);
        let mut session = Session::new();
        let env = Environment::genesis(BiomeId::Desert);
        let genome = Genome::genesis()
            .with_trait(TraitKey::BodySize, 1.0)
            .with_trait(TraitKey::MetabolicRate, 1.0)
            .with_trait(TraitKey::Sociality, 1.0)
            .with_trait(TraitKey::FeedingStrategy, 0.5)
            .with_trait(TraitKey::WaterRetention, 0.0)
            .with_trait(TraitKey::Thermoregulation, 0.0);
        let opts = CycleOptions { disable_death: false };

        let mut died = false;
        for _ in 0..200 {
            let outcome = session.run_cycle(&genome, &env, &registry, &opts, &mut rng);
            if !outcome.survived {
                assert!(outcome.cause_of_death.is_some());
                died = true;
                break;
            }
        }
        assert!(died, "expected this genome to die in the desert");
    }

    #[test]
    fn test_forced_mutation_after_low_rate_streak() {
        let registry = BiomeRegistry::default();
        let mut rng = Xoshiro256StarStar::seed_from_u64(4);
        let mut session = Session::new();
        let env = Environment::genesis(BiomeId::Temperate);

        // Mutation rate pinned to zero: the only mutations possible are
        // forced ones
        let genome = Genome::genesis().with_trait(TraitKey::MutationRate, 0.0);
        let opts = CycleOptions::default();

        let mut forced_at = None;
        for i in 0..LOW_MUTATION_STREAK_LIMIT * 2 {
            // A calm environment keeps the roll chance low but not zero,
            // so only count mutations at the streak boundary
            let outcome = session.run_cycle(&genome, &env, &registry, &opts, &mut rng);
            if outcome.mutated.is_some() && (i + 1) % LOW_MUTATION_STREAK_LIMIT == 0 {
                forced_at = Some(i);
                break;
            }
        }
        assert!(
            forced_at.is_some(),
            "expected a forced mutation at the streak limit"
        );
    }

    #[test]
    fn test_session_reset_clears_counters() {
        let mut session = Session::new();
        session.cycle_count = 500;
        session.low_mutation_streak = 42;
        session.reset();
        assert_eq!(session.cycle_count, 0);
        assert_eq!(session.low_mutation_streak, 0);
    }

    #[test]
    fn test_batch_chunks_and_carries_state() {
        let registry = BiomeRegistry::default();
        let mut rng = Xoshiro256StarStar::seed_from_u64(6);
        let mut session = Session::new();

        let opts = BatchOptions {
            cycles: 1000,
            chunk_size: 128,
            locked_biome: Some(BiomeId::Temperate),
            ..BatchOptions::default()
        };

        let mut chunk_marks = Vec::new();
        let outcome = session.run_batch(
            Genome::genesis(),
            Environment::genesis(BiomeId::Temperate),
            &registry,
            &opts,
            &mut rng,
            |done| chunk_marks.push(done),
        );

        assert_eq!(outcome.cycles_run, 1000);
        assert_eq!(session.cycle_count, 1000);
        assert_eq!(*chunk_marks.last().unwrap(), 1000);
        assert!(chunk_marks.len() >= 7, "expected multiple chunks");
        assert!(outcome.genome.is_normalized());
    }
}
